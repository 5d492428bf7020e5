use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Currency {
    Amd,
    Usd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Language {
    En,
    Ru,
    Hy,
}

impl Language {
    /// Parse a raw `lang` value or `Accept-Language` header. Unknown or
    /// missing values fall back to English.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let candidate = raw
            .unwrap_or("en")
            .split(',')
            .next()
            .unwrap_or("en")
            .split(['-', '_', ';'])
            .next()
            .unwrap_or("en")
            .trim()
            .to_lowercase();
        match candidate.as_str() {
            "ru" => Language::Ru,
            "hy" => Language::Hy,
            _ => Language::En,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
            Language::Hy => "hy",
        }
    }
}

/// Text with a required default and optional translations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    pub default: String,
    #[serde(default)]
    pub en: Option<String>,
    #[serde(default)]
    pub ru: Option<String>,
    #[serde(default)]
    pub hy: Option<String>,
}

impl LocalizedText {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            ..Default::default()
        }
    }

    pub fn resolve(&self, lang: Language) -> &str {
        let translated = match lang {
            Language::En => self.en.as_deref(),
            Language::Ru => self.ru.as_deref(),
            Language::Hy => self.hy.as_deref(),
        };
        match translated {
            Some(t) if !t.trim().is_empty() => t,
            _ => &self.default,
        }
    }

    /// Trim every field and drop blank translations.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            default: self.default.trim().to_string(),
            en: clean(self.en),
            ru: clean(self.ru),
            hy: clean(self.hy),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFeatures {
    #[serde(default)]
    pub unlimited_applications: bool,
    #[serde(default)]
    pub publish_permanent_orders: bool,
    #[serde(default)]
    pub publish_markets: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureDescription {
    pub key: &'static str,
    pub label: &'static str,
}

impl PlanFeatures {
    /// Human readable entries for the enabled flags, in a fixed order.
    pub fn describe(&self) -> Vec<FeatureDescription> {
        let all = [
            (
                self.unlimited_applications,
                "unlimitedApplications",
                "Unlimited order applications (no credit cost)",
            ),
            (
                self.publish_permanent_orders,
                "publishPermanentOrders",
                "Publish permanent/bookable orders",
            ),
            (
                self.publish_markets,
                "publishMarkets",
                "Publish markets/services",
            ),
        ];
        all.into_iter()
            .filter(|(enabled, _, _)| *enabled)
            .map(|(_, key, label)| FeatureDescription { key, label })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: i64,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub price_cents: i64,
    pub old_price_cents: Option<i64>,
    pub currency: Currency,
    pub duration_days: i32,
    pub is_recurring: bool,
    pub is_active: bool,
    pub features: PlanFeatures,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    /// Whole percent saved against the old price, if the plan is discounted.
    pub fn discount_percent(&self) -> Option<i64> {
        match self.old_price_cents {
            Some(old) if old > self.price_cents && old > 0 => {
                Some((old - self.price_cents) * 100 / old)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(price_cents: i64, old_price_cents: Option<i64>) -> SubscriptionPlan {
        SubscriptionPlan {
            id: 1,
            name: LocalizedText::new("Pro"),
            description: None,
            price_cents,
            old_price_cents,
            currency: Currency::Amd,
            duration_days: 30,
            is_recurring: false,
            is_active: true,
            features: PlanFeatures::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn language_from_raw() {
        assert_eq!(Language::from_raw(None), Language::En);
        assert_eq!(Language::from_raw(Some("ru-RU,ru;q=0.9")), Language::Ru);
        assert_eq!(Language::from_raw(Some("hy")), Language::Hy);
        assert_eq!(Language::from_raw(Some("de")), Language::En);
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let text = LocalizedText {
            default: "Premium".to_string(),
            en: None,
            ru: Some("Премиум".to_string()),
            hy: Some("   ".to_string()),
        };
        assert_eq!(text.resolve(Language::Ru), "Премиум");
        assert_eq!(text.resolve(Language::En), "Premium");
        assert_eq!(text.resolve(Language::Hy), "Premium");
    }

    #[test]
    fn normalized_drops_blank_translations() {
        let text = LocalizedText {
            default: "  Basic ".to_string(),
            en: Some("".to_string()),
            ru: Some(" Базовый ".to_string()),
            hy: None,
        }
        .normalized();
        assert_eq!(text.default, "Basic");
        assert_eq!(text.en, None);
        assert_eq!(text.ru.as_deref(), Some("Базовый"));
    }

    #[test]
    fn describe_lists_enabled_features_only() {
        let features = PlanFeatures {
            unlimited_applications: true,
            publish_permanent_orders: false,
            publish_markets: true,
        };
        let keys: Vec<_> = features.describe().iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["unlimitedApplications", "publishMarkets"]);
        assert!(PlanFeatures::default().describe().is_empty());
    }

    #[test]
    fn discount_percent() {
        assert_eq!(plan(7_500, Some(10_000)).discount_percent(), Some(25));
        assert_eq!(plan(10_000, Some(10_000)).discount_percent(), None);
        assert_eq!(plan(10_000, None).discount_percent(), None);
        assert_eq!(plan(12_000, Some(10_000)).discount_percent(), None);
    }

    #[test]
    fn currency_round_trips_as_uppercase() {
        use std::str::FromStr;
        assert_eq!(Currency::from_str("amd").unwrap(), Currency::Amd);
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(serde_json::to_value(Currency::Amd).unwrap(), "AMD");
    }
}
