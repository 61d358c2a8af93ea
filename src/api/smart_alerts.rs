//! Smart alert aggregation across the three alert-config endpoints.
//!
//! Smart alerts have no single collection. They are split across the
//! mobile-app, application and infrastructure alert-config APIs, which are
//! always queried in that order, one after another.
//!
//! - Listing concatenates whatever each endpoint returns; an endpoint that
//!   fails contributes nothing.
//! - Fetching by id tries each endpoint's `/{id}` path and takes the first
//!   success.
//! - Importing classifies the payload by shape to pick the endpoint.

use serde_json::Value;
use tracing::debug;

use super::ApiClient;

/// The three smart alert sub-types, plus the classification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartAlertKind {
    Infra,
    Application,
    MobileApp,
    Unknown,
}

/// Endpoint query order for listing and fetching.
pub const ENDPOINT_ORDER: [SmartAlertKind; 3] = [
    SmartAlertKind::MobileApp,
    SmartAlertKind::Application,
    SmartAlertKind::Infra,
];

impl SmartAlertKind {
    /// Collection path for this kind; `None` for `Unknown`.
    #[must_use]
    pub const fn api_path(self) -> Option<&'static str> {
        match self {
            Self::MobileApp => Some("api/events/settings/mobile-app-alert-configs"),
            Self::Application => Some("api/events/settings/application-alert-configs"),
            Self::Infra => Some("api/events/settings/infra-alert-configs"),
            Self::Unknown => None,
        }
    }

    /// Human-readable label for log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MobileApp => "mobile app smart alert",
            Self::Application => "application smart alert",
            Self::Infra => "infrastructure smart alert",
            Self::Unknown => "unknown smart alert",
        }
    }
}

/// Decide which endpoint an alert payload belongs to.
///
/// Precedence, first match wins:
/// 1. a rule carrying `entityType` (`rule.entityType`, `rules[].entityType`
///    or `rules[].rule.entityType`) → [`SmartAlertKind::Infra`]
/// 2. `applicationId`, or a non-empty `applications` array/map →
///    [`SmartAlertKind::Application`]
/// 3. `mobileAppId` → [`SmartAlertKind::MobileApp`]
///
/// Anything else is [`SmartAlertKind::Unknown`].
#[must_use]
pub fn classify_smart_alert(payload: &Value) -> SmartAlertKind {
    if has_entity_type_rule(payload) {
        SmartAlertKind::Infra
    } else if is_present(payload.get("applicationId")) || has_applications(payload) {
        SmartAlertKind::Application
    } else if is_present(payload.get("mobileAppId")) {
        SmartAlertKind::MobileApp
    } else {
        SmartAlertKind::Unknown
    }
}

fn has_entity_type_rule(payload: &Value) -> bool {
    let rule_has_entity_type = |rule: &Value| is_present(rule.get("entityType"));

    if payload.get("rule").is_some_and(rule_has_entity_type) {
        return true;
    }

    payload
        .get("rules")
        .and_then(Value::as_array)
        .is_some_and(|rules| {
            rules.iter().any(|entry| {
                rule_has_entity_type(entry) || entry.get("rule").is_some_and(rule_has_entity_type)
            })
        })
}

fn has_applications(payload: &Value) -> bool {
    match payload.get("applications") {
        Some(Value::Array(apps)) => !apps.is_empty(),
        Some(Value::Object(apps)) => !apps.is_empty(),
        _ => false,
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// List smart alerts from all three endpoints.
///
/// Endpoints are queried sequentially in [`ENDPOINT_ORDER`]. A failing
/// endpoint, or one that does not answer with an array, is logged at debug
/// level and contributes zero items.
pub async fn list_smart_alerts(client: &ApiClient, verbose: bool) -> Vec<Value> {
    let mut alerts = Vec::new();

    for kind in ENDPOINT_ORDER {
        let Some(path) = kind.api_path() else { continue };

        match client.get_json(path).await {
            Ok(Value::Array(items)) => {
                debug!(endpoint = path, count = items.len(), "Listed {}s", kind.label());
                alerts.extend(items);
            }
            Ok(other) => {
                debug!(endpoint = path, "Unexpected {} list payload: {other}", kind.label());
            }
            Err(e) => {
                debug!(endpoint = path, "No {}s available: {}", kind.label(), e.render(verbose));
            }
        }
    }

    alerts
}

/// Fetch one smart alert by id from whichever endpoint has it.
///
/// Returns the first successful response together with its kind, or `None`
/// if all three endpoints fail.
pub async fn get_smart_alert(
    client: &ApiClient,
    id: &str,
    verbose: bool,
) -> Option<(SmartAlertKind, Value)> {
    for kind in ENDPOINT_ORDER {
        let Some(path) = kind.api_path() else { continue };

        match client.get_json(&format!("{path}/{id}")).await {
            Ok(alert) => return Some((kind, alert)),
            Err(e) => {
                debug!(
                    endpoint = path,
                    "Smart alert (id={id}) not found: {}",
                    e.render(verbose)
                );
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_infra_by_rule_entity_type() {
        let alert = json!({"name": "cpu", "rule": {"entityType": "host", "metricName": "cpu.used"}});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Infra);

        let alert = json!({"name": "cpu", "rules": [{"rule": {"entityType": "host"}}]});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Infra);

        let alert = json!({"name": "cpu", "rules": [{"entityType": "host"}]});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Infra);
    }

    #[test]
    fn test_classify_precedence_infra_over_application() {
        let alert = json!({
            "applicationId": "app-1",
            "mobileAppId": "mob-1",
            "rule": {"entityType": "host"}
        });
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Infra);

        let alert = json!({"applicationId": "app-1", "mobileAppId": "mob-1"});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Application);
    }

    #[test]
    fn test_classify_application_by_applications() {
        let alert = json!({"applications": {"app-1": {"applicationId": "app-1"}}});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Application);

        let alert = json!({"applications": ["app-1"]});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Application);

        let alert = json!({"applications": []});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Unknown);
    }

    #[test]
    fn test_classify_mobile_and_unknown() {
        let alert = json!({"name": "crash", "mobileAppId": "mob-1"});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::MobileApp);

        let alert = json!({"name": "mystery", "rule": {"metricName": "x"}});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Unknown);

        let alert = json!({"name": "null ids", "applicationId": null, "mobileAppId": ""});
        assert_eq!(classify_smart_alert(&alert), SmartAlertKind::Unknown);
    }

    #[test]
    fn test_endpoint_order_is_fixed() {
        let paths: Vec<_> = ENDPOINT_ORDER.iter().filter_map(|k| k.api_path()).collect();
        assert_eq!(
            paths,
            vec![
                "api/events/settings/mobile-app-alert-configs",
                "api/events/settings/application-alert-configs",
                "api/events/settings/infra-alert-configs",
            ]
        );
        assert_eq!(SmartAlertKind::Unknown.api_path(), None);
    }
}
