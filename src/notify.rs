use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

use crate::error::NotifyError;
use crate::prediction::Tier;
use crate::{format_number, Trend};

const TELEGRAM_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, trend: &Trend) -> Result<(), NotifyError>;
}

/// High priority or an engine tier of LIKELY and above.
pub fn should_alert(trend: &Trend) -> bool {
    trend.priority
        || trend
            .prediction_details
            .as_ref()
            .is_some_and(|details| details.tier >= Tier::Likely)
}

pub fn format_alert(trend: &Trend, sent_at: &str) -> String {
    let volume = trend
        .metrics
        .volume
        .map(|volume| format_number(volume as f64))
        .unwrap_or_else(|| "N/A".to_string());
    let source = if trend.metrics.source.is_empty() {
        "Multiple"
    } else {
        trend.metrics.source.as_str()
    };

    format!(
        "🚨 HIGH PRIORITY TREND ALERT\n\n\
         <b>{}</b>\n\n\
         📊 Prediction: {}% explosion probability\n\
         ⚡ Speed: {}\n\
         📍 Stage: {}\n\
         🌍 Location: {}\n\n\
         💡 <b>Why spreading:</b>\n{}\n\n\
         🎯 <b>Analysis:</b>\n{}\n\n\
         📈 Volume: {}\n\
         📱 Source: {}\n\n\
         ⏰ {}",
        escape_html(&trend.title),
        trend.prediction,
        trend.speed.label().to_uppercase(),
        trend.stage.label().to_uppercase(),
        escape_html(&trend.geo),
        escape_html(&trend.trigger),
        escape_html(&trend.analysis),
        volume,
        escape_html(source),
        sent_at
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Clone)]
pub struct TelegramSink {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn from_env() -> Option<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        let chat_id = env::var("TELEGRAM_CHAT_ID")
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        let api_base = env::var("TELEGRAM_API_BASE")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        match Self::new(api_base, bot_token, chat_id, TELEGRAM_TIMEOUT) {
            Ok(sink) => Some(sink),
            Err(err) => {
                warn!("Telegram sink disabled - error={}", err);
                None
            }
        }
    }

    /// Every request, including reading the reply, is bounded by `timeout`.
    pub fn new(
        api_base: String,
        bot_token: String,
        chat_id: String,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base,
            bot_token,
            chat_id,
        })
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, trend: &Trend) -> Result<(), NotifyError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token
        );
        let sent_at = chrono::Local::now().format("%H:%M:%S").to_string();
        let request = SendMessage {
            chat_id: self.chat_id.clone(),
            text: format_alert(trend, &sent_at),
            parse_mode: "HTML".to_string(),
        };

        let response = self.client.post(url).json(&request).send().await?;
        let body: TelegramResponse = response
            .json()
            .await
            .map_err(|err| NotifyError::Rejected(format!("telegram response parse failed: {}", err)))?;

        if body.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected(
                body.description
                    .unwrap_or_else(|| "telegram rejected the message".to_string()),
            ))
        }
    }
}

#[derive(Serialize)]
struct SendMessage {
    chat_id: String,
    text: String,
    parse_mode: String,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::sample_trends;
    use crate::prediction::Confidence;
    use crate::PredictionDetails;

    #[test]
    fn alerts_on_priority_or_likely_tier() {
        let samples = sample_trends(0);
        assert!(should_alert(&samples[0]));

        let mut quiet = samples[5].clone();
        assert!(!should_alert(&quiet));

        quiet.prediction_details = Some(PredictionDetails {
            confidence: Confidence::Medium,
            reasoning: Vec::new(),
            tier: Tier::Likely,
        });
        assert!(should_alert(&quiet));

        quiet.prediction_details = Some(PredictionDetails {
            confidence: Confidence::Medium,
            reasoning: Vec::new(),
            tier: Tier::Possible,
        });
        assert!(!should_alert(&quiet));
    }

    #[tokio::test]
    async fn unresponsive_telegram_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let sink = TelegramSink::new(
            format!("http://{}", addr),
            "token".to_string(),
            "chat".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        let started = std::time::Instant::now();
        let result = sink.send(&sample_trends(0)[0]).await;

        assert!(matches!(result, Err(NotifyError::Network(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn alert_text_escapes_markup() {
        let mut trend = sample_trends(0)[2].clone();
        trend.title = "<script> & friends".to_string();
        trend.metrics.volume = Some(1_234_567);

        let text = format_alert(&trend, "12:00:00");

        assert!(text.contains("<b>&lt;script&gt; &amp; friends</b>"));
        assert!(text.contains("Volume: 1,234,567"));
        assert!(text.contains("Speed: ACCELERATING"));
        assert!(text.ends_with("12:00:00"));
    }
}
