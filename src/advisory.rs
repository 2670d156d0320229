use std::time::Duration;

use color_eyre::{Result, eyre::eyre};
use serde::Deserialize;
use strum::Display;
use tracing::{debug, warn};

use crate::config::AdvisoryConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Eyes {
    #[default]
    Neutral,
    Happy,
    Soft,
    Squint,
    Wide,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mouth {
    #[default]
    Smile,
    Grin,
    Flat,
    Frown,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Brows {
    #[default]
    Level,
    Raised,
    Knit,
}

/// What the avatar service makes of a mood: a face, a backdrop, a one-liner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AvatarAdvice {
    #[serde(default)]
    pub eyes: Eyes,
    #[serde(default)]
    pub mouth: Mouth,
    #[serde(default)]
    pub brows: Brows,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_phrase")]
    pub phrase: String,
}

impl Default for AvatarAdvice {
    fn default() -> Self {
        Self {
            eyes: Eyes::default(),
            mouth: Mouth::default(),
            brows: Brows::default(),
            background: default_background(),
            phrase: default_phrase(),
        }
    }
}

fn default_background() -> String {
    "ffd166".to_string()
}

fn default_phrase() -> String {
    "Logged.".to_string()
}

impl AvatarAdvice {
    /// Opaque image descriptor stored when the user attached no picture.
    pub fn image_url(&self) -> String {
        format!(
            "avatar:eyes={},mouth={},brows={},bg={}",
            self.eyes, self.mouth, self.brows, self.background
        )
    }

    fn sanitized(mut self) -> Self {
        if !is_hex6(&self.background) {
            self.background = default_background();
        }
        self
    }
}

fn is_hex6(s: &str) -> bool {
    s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Ask the avatar service about a mood. Any failure (unconfigured, timeout,
/// refusal, garbage response) degrades to the stock advice; a post never
/// fails because of this call.
pub async fn advise(cfg: &AdvisoryConfig, mood: &str) -> AvatarAdvice {
    let Some(endpoint) = cfg.endpoint.as_deref() else {
        debug!("avatar advisory not configured, using the stock face");
        return AvatarAdvice::default();
    };
    match request(endpoint, mood).await {
        Ok(advice) => advice.sanitized(),
        Err(err) => {
            warn!("avatar advice failed, using the stock face: {err:?}");
            AvatarAdvice::default()
        }
    }
}

async fn request(endpoint: &str, mood: &str) -> Result<AvatarAdvice> {
    let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let response = client
        .post(endpoint)
        .json(&serde_json::json!({ "mood": mood }))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(eyre!("avatar service answered {status}"));
    }
    Ok(response.json::<AvatarAdvice>().await?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_fields_fall_back_per_field() {
        let advice: AvatarAdvice = serde_json::from_str(r#"{"eyes": "happy"}"#).unwrap();
        assert_eq!(advice.eyes, Eyes::Happy);
        assert_eq!(advice.mouth, Mouth::Smile);
        assert_eq!(advice.background, "ffd166");
        assert_eq!(advice.phrase, "Logged.");
    }

    #[test]
    fn a_bad_background_color_is_replaced() {
        let advice: AvatarAdvice =
            serde_json::from_str(r##"{"background": "#ff0000"}"##).unwrap();
        assert_eq!(advice.sanitized().background, "ffd166");
    }

    #[test]
    fn descriptor_is_stable_and_parseable_vocabulary() {
        let advice = AvatarAdvice {
            eyes: Eyes::Squint,
            mouth: Mouth::Grin,
            brows: Brows::Raised,
            background: "aab9cf".to_string(),
            phrase: "Rough one.".to_string(),
        };
        assert_eq!(
            advice.image_url(),
            "avatar:eyes=squint,mouth=grin,brows=raised,bg=aab9cf"
        );
    }

    #[test]
    fn unknown_vocabulary_rejects_the_whole_response() {
        // The caller maps the error to the stock advice.
        assert!(serde_json::from_str::<AvatarAdvice>(r#"{"eyes": "laser"}"#).is_err());
    }
}
