use briefing_core::{BriefingProfile, DerivedIndicators, Headline, Instrument, Quote, QuoteSnapshot};
use chrono::NaiveDate;

use crate::format::{format_price, format_signed_pct};

pub const OVERBOUGHT_RSI: f64 = 70.0;
pub const OVERSOLD_RSI: f64 = 30.0;

/// Long-term trend: latest price against the two-year mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    /// Not enough history for the long mean
    Undetermined,
}

impl Trend {
    pub fn classify(price: f64, long_sma: Option<f64>) -> Self {
        match long_sma {
            Some(mean) if price > mean => Trend::Bullish,
            Some(_) => Trend::Bearish,
            None => Trend::Undetermined,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Bullish => "BULLISH 🐂",
            Trend::Bearish => "BEARISH 🐻",
            Trend::Undetermined => "UNDETERMINED",
        }
    }
}

/// Momentum band from RSI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Overbought,
    Oversold,
    Neutral,
    Unavailable,
}

impl Sentiment {
    pub fn classify(rsi: Option<f64>) -> Self {
        match rsi {
            Some(v) if v > OVERBOUGHT_RSI => Sentiment::Overbought,
            Some(v) if v < OVERSOLD_RSI => Sentiment::Oversold,
            Some(_) => Sentiment::Neutral,
            None => Sentiment::Unavailable,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Overbought => "⚠️ OVERBOUGHT: correction risk.",
            Sentiment::Oversold => "💎 OPPORTUNITY: rebound zone.",
            Sentiment::Neutral => "⚖️ NEUTRAL: consolidation.",
            Sentiment::Unavailable => "❔ NO SIGNAL: RSI unavailable.",
        }
    }
}

pub fn situation(indicators: &DerivedIndicators) -> String {
    let sentiment = Sentiment::classify(indicators.rsi);
    let trend = Trend::classify(indicators.price, indicators.long_sma);
    format!("{} 2Y trend: {}", sentiment.label(), trend.label())
}

fn quote_line(instrument: &Instrument, quote: &Quote) -> String {
    match quote {
        Quote::Available { price, change_pct } => {
            let price = format_price(Some(*price), instrument.price_decimals, instrument.currency);
            if instrument.show_change {
                format!("• {}: {} ({})", instrument.label, price, format_signed_pct(*change_pct))
            } else {
                format!("• {}: {}", instrument.label, price)
            }
        }
        Quote::Unavailable { .. } => format!("• {}: n/a", instrument.label),
    }
}

fn headlines_block(headlines: Option<&[Headline]>) -> String {
    match headlines {
        Some(items) if !items.is_empty() => items
            .iter()
            .map(|h| format!("📰 {}\n🔗 {}", h.title, h.link))
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => "No headlines available.".to_string(),
    }
}

/// Assemble the text briefing. `headlines` is `None` when the feed could not be read.
pub fn compose_report(
    profile: &BriefingProfile,
    date: NaiveDate,
    indicators: &DerivedIndicators,
    quotes: &QuoteSnapshot,
    headlines: Option<&[Headline]>,
) -> String {
    let mut assets = vec![format!(
        "• ₿ BTC: {} ({})",
        format_price(Some(indicators.price), 0, true),
        format_signed_pct(indicators.change_pct)
    )];
    assets.extend(
        quotes
            .entries
            .iter()
            .map(|(instrument, quote)| quote_line(instrument, quote)),
    );

    let rsi = indicators
        .rsi
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        "🦅 *{title} – {date}*\n\
         \n\
         1️⃣ *SITUATION*\n\
         {situation}\n\
         \n\
         2️⃣ *KEY ASSETS*\n\
         {assets}\n\
         \n\
         3️⃣ *BTC TECHNICALS*\n\
         • RSI (14): {rsi}\n\
         • 2Y mean: {sma}\n\
         • Support: {support}\n\
         • From ATH: {ath}\n\
         \n\
         4️⃣ *HEADLINES*\n\
         {headlines}\n",
        title = profile.title,
        date = date.format("%d %b"),
        situation = situation(indicators),
        assets = assets.join("\n"),
        rsi = rsi,
        sma = format_price(indicators.long_sma, 0, true),
        support = format_price(Some(indicators.range_low), 0, true),
        ath = format_signed_pct(indicators.ath_distance_pct),
        headlines = headlines_block(headlines),
    )
}
