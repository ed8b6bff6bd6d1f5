//! Plain-text rendering of alert events.

use watcher_core::{AlertEvent, WatchValue};

/// Deals listed per message for storefront sales.
pub const DEFAULT_TOP_N: usize = 5;

/// How each bot phrases its alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Storefront sale: summary + top deals, then the next batch.
    ShopSale { top_n: usize },
    /// Single product page went on sale.
    ProductSale,
    /// Comparison price dropped below the limit.
    PriceDeal,
    /// New offer on a listing page.
    NewListing,
}

impl Template {
    /// Render one event into the messages to send, in order.
    pub fn render(&self, event: &AlertEvent) -> Vec<String> {
        match self {
            Template::ShopSale { top_n } => render_shop_sale(event, *top_n),
            Template::ProductSale => vec![render_product_sale(event)],
            Template::PriceDeal => vec![render_price_deal(event)],
            Template::NewListing => vec![render_new_listing(event)],
        }
    }
}

fn render_shop_sale(event: &AlertEvent, top_n: usize) -> Vec<String> {
    let label = event.display_name();
    let top_n = top_n.max(1);
    let top: Vec<&String> = event.details.iter().take(top_n).collect();
    let next: Vec<&String> = event.details.iter().skip(top_n).take(top_n).collect();

    let mut first = format!("🚨 {}: sale detected!\n\n", label);
    if let Some(note) = &event.note {
        first.push_str(note);
        first.push('\n');
    }
    if let Some(url) = &event.url {
        first.push_str(&format!("🔗 {}\n", url));
    }
    let shown = if top.is_empty() { top_n } else { top.len() };
    first.push_str(&format!("\n🔥 Top {} deals:\n", shown));
    if top.is_empty() {
        first.push_str("• (no details available)");
    } else {
        first.push_str(&join_lines(&top));
    }

    let remaining = event.details.len().saturating_sub(top.len());
    let mut second = format!(
        "📩 More info:\n• Further discounted variants (after top {}): {}\n",
        top.len(),
        remaining
    );
    if next.is_empty() {
        second.push_str("\n(No further deals.)");
    } else {
        second.push_str("\n➡️ Next top deals:\n");
        second.push_str(&join_lines(&next));
    }

    vec![first, second]
}

fn render_product_sale(event: &AlertEvent) -> String {
    let mut text = format!("{}: sale started", event.display_name());
    for line in &event.details {
        text.push('\n');
        text.push_str(line);
    }
    if let Some(url) = &event.url {
        text.push('\n');
        text.push_str(url);
    }
    text
}

fn render_price_deal(event: &AlertEvent) -> String {
    let price = match &event.current {
        WatchValue::Number(n) => format!("CHF {:.2}", n),
        other => other.to_string(),
    };
    let mut text = format!(
        "🚨 DEAL ALARM 🚨\n{}\nPrice: {}\nSource: {}",
        event.label.as_deref().unwrap_or("Product"),
        price,
        event.key
    );
    if let Some(previous) = event.previous.as_ref().and_then(WatchValue::as_f64) {
        text.push_str(&format!("\nPrevious: CHF {:.2}", previous));
    }
    if let Some(url) = &event.url {
        text.push('\n');
        text.push_str(url);
    }
    if let Some(shot) = event.details.first() {
        text.push_str(&format!("\n\n📸 {}", shot));
    }
    text
}

fn render_new_listing(event: &AlertEvent) -> String {
    let mut text = format!("🆕 {}: new offer\n{}", event.display_name(), event.current);
    if let Some(url) = &event.url {
        text.push('\n');
        text.push_str(url);
    }
    if let Some(shot) = event.details.first() {
        text.push_str(&format!("\n📸 {}", shot));
    }
    text
}

fn join_lines(lines: &[&String]) -> String {
    lines
        .iter()
        .map(|l| l.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use watcher_core::{AlertReason, Sample};

    fn shop_event(deals: usize) -> AlertEvent {
        let details = (1..=deals).map(|i| format!("• deal {}", i)).collect();
        let sample = Sample::new(true)
            .with_label("MNSTRY")
            .with_url("https://mnstry.com/")
            .with_note("Discounted products: 2\nDiscounted variants: 7")
            .with_details(details);
        AlertEvent::new("mnstry", Some(WatchValue::Flag(false)), &sample, AlertReason::BecameTrue)
    }

    #[test]
    fn test_shop_sale_two_messages() {
        let messages = Template::ShopSale { top_n: 5 }.render(&shop_event(7));
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            "🚨 MNSTRY: sale detected!\n\n\
             Discounted products: 2\nDiscounted variants: 7\n\
             🔗 https://mnstry.com/\n\n\
             🔥 Top 5 deals:\n\
             • deal 1\n\n• deal 2\n\n• deal 3\n\n• deal 4\n\n• deal 5"
        );
        assert_eq!(
            messages[1],
            "📩 More info:\n• Further discounted variants (after top 5): 2\n\n\
             ➡️ Next top deals:\n• deal 6\n\n• deal 7"
        );
    }

    #[test]
    fn test_shop_sale_without_further_deals() {
        let messages = Template::ShopSale { top_n: 5 }.render(&shop_event(3));
        assert!(messages[0].contains("🔥 Top 3 deals:"));
        assert_eq!(
            messages[1],
            "📩 More info:\n• Further discounted variants (after top 3): 0\n\n(No further deals.)"
        );
    }

    #[test]
    fn test_product_sale() {
        let sample = Sample::new(true)
            .with_label("Grail CF SL 8")
            .with_url("https://www.canyon.com/x")
            .with_details(vec![
                "Current: 2199.00 CHF".to_string(),
                "Original: 2799.00 CHF".to_string(),
            ]);
        let event = AlertEvent::new("grail", None, &sample, AlertReason::BecameTrue);
        assert_eq!(
            Template::ProductSale.render(&event),
            vec!["Grail CF SL 8: sale started\nCurrent: 2199.00 CHF\nOriginal: 2799.00 CHF\nhttps://www.canyon.com/x"
                .to_string()]
        );
    }

    #[test]
    fn test_price_deal() {
        let sample = Sample::new(389.0)
            .with_label("Garmin Forerunner 965")
            .with_url("https://www.toppreise.ch/p/1")
            .with_details(vec!["https://image.thum.io/get/width/1200/https://www.toppreise.ch/p/1".to_string()]);
        let event = AlertEvent::new(
            "Toppreise",
            Some(WatchValue::Number(399.0)),
            &sample,
            AlertReason::Decreased { below: Some(400.0) },
        );
        assert_eq!(
            Template::PriceDeal.render(&event)[0],
            "🚨 DEAL ALARM 🚨\nGarmin Forerunner 965\nPrice: CHF 389.00\nSource: Toppreise\n\
             Previous: CHF 399.00\nhttps://www.toppreise.ch/p/1\n\n\
             📸 https://image.thum.io/get/width/1200/https://www.toppreise.ch/p/1"
        );
    }

    #[test]
    fn test_new_listing() {
        let sample = Sample::new("Garmin Forerunner 965")
            .with_label("Enjoy365")
            .with_url("https://enjoy365.ch/p/1");
        let event = AlertEvent::new("https://enjoy365.ch/p/1", None, &sample, AlertReason::NewKey);
        assert_eq!(
            Template::NewListing.render(&event)[0],
            "🆕 Enjoy365: new offer\nGarmin Forerunner 965\nhttps://enjoy365.ch/p/1"
        );
    }
}
