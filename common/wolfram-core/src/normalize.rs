//! Result normalization
//!
//! Turns a [`QueryResult`] into the shapes callers ask for: the primary text,
//! a single pod's text, or every textual pod as an ordered map. All functions
//! are pure; normalizing the same result twice gives the same output.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::WolframError;
use crate::types::QueryResult;

/// Ordered mapping of `"{title} ({id})"` to that pod's plaintexts
pub type PodMap = IndexMap<String, Vec<String>>;

/// Outcome of a lookup against a provider response
///
/// Transport and malformed-response failures are not represented here; they
/// travel in the surrounding `Result`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    ProviderFailure(String),
}

impl<T> Lookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(v) => Lookup::Found(f(v)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::ProviderFailure(msg) => Lookup::ProviderFailure(msg),
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Lookup<U>) -> Lookup<U> {
        match self {
            Lookup::Found(v) => f(v),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::ProviderFailure(msg) => Lookup::ProviderFailure(msg),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// Convert for call sites that treat anything but a hit as an error
    pub fn into_result(self, what: &str) -> Result<T, WolframError> {
        match self {
            Lookup::Found(v) => Ok(v),
            Lookup::NotFound => Err(WolframError::NotFound(what.to_string())),
            Lookup::ProviderFailure(msg) => Err(WolframError::ProviderFailure(msg)),
        }
    }
}

/// Wrap a result as a lookup on its success flag
pub fn check_success(result: QueryResult) -> Lookup<QueryResult> {
    match result.failure_message() {
        Some(msg) => Lookup::ProviderFailure(msg.to_string()),
        None => Lookup::Found(result),
    }
}

/// Text of the first subpod of the first pod
///
/// Selection is positional; the pod's id is never consulted.
pub fn first_pod_text(result: &QueryResult) -> Lookup<String> {
    if let Some(msg) = result.failure_message() {
        return Lookup::ProviderFailure(msg.to_string());
    }

    result
        .pods
        .first()
        .and_then(|pod| pod.subpods.first())
        .and_then(|subpod| subpod.text())
        .map(|text| Lookup::Found(text.to_string()))
        .unwrap_or(Lookup::NotFound)
}

/// Text of the first subpod of the pod with the given id
pub fn pod_text(result: &QueryResult, pod_id: &str) -> Lookup<String> {
    if let Some(msg) = result.failure_message() {
        return Lookup::ProviderFailure(msg.to_string());
    }

    result
        .pods
        .iter()
        .find(|pod| pod.id == pod_id)
        .and_then(|pod| pod.subpods.first())
        .and_then(|subpod| subpod.text())
        .map(|text| Lookup::Found(text.to_string()))
        .unwrap_or(Lookup::NotFound)
}

/// Every pod with at least one non-empty plaintext, in provider order
///
/// Pods whose subpods are all textless are omitted, with no placeholder.
pub fn all_pods_as_map(result: &QueryResult) -> PodMap {
    let mut map = PodMap::new();
    for pod in &result.pods {
        let texts: Vec<String> = pod.texts().map(str::to_string).collect();
        if !texts.is_empty() {
            map.insert(pod.label(), texts);
        }
    }
    map
}

/// Render a section map as text under a heading
///
/// With `numbered`, entries inside each section are prefixed `1.`, `2.`, ...
pub fn render_sections(heading: &str, sections: &PodMap, numbered: bool) -> String {
    let mut out = format!("{}\n\n{}\n\n", heading, "=".repeat(50));

    for (label, texts) in sections {
        out.push_str(&format!("{}:\n{}\n", label, "-".repeat(30)));
        for (i, text) in texts.iter().enumerate() {
            if numbered {
                out.push_str(&format!("{}. {}\n", i + 1, text));
            } else {
                out.push_str(text);
                out.push('\n');
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_response;

    fn france() -> QueryResult {
        parse_response(
            r#"{"queryresult": {"success": true, "numpods": 4, "pods": [
                {"title": "Input interpretation", "id": "Input",
                 "subpods": [{"plaintext": "France | population"}]},
                {"title": "Result", "id": "Result",
                 "subpods": [{"plaintext": "68.5 million people (world rank: 20th) (2023 estimate)"}]},
                {"title": "Recent population history", "id": "RecentHistory:Population:CountryData",
                 "subpods": [{"img": {"src": "chart.gif"}}]},
                {"title": "Demographics", "id": "Demographics",
                 "subpods": [{"plaintext": ""}, {"plaintext": "median age | 42"}, {"plaintext": "life expectancy | 82"}]}
            ]}}"#,
        )
        .unwrap()
        .result
    }

    #[test]
    fn test_all_pods_as_map_skips_textless_pods() {
        let map = all_pods_as_map(&france());

        // 4 pods, 3 with text
        assert_eq!(map.len(), 3);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "Input interpretation (Input)",
                "Result (Result)",
                "Demographics (Demographics)"
            ]
        );
        assert!(keys[0].contains("Input"));
        assert_eq!(map["Demographics (Demographics)"], vec!["median age | 42", "life expectancy | 82"]);
        assert!(map.values().flatten().all(|t| !t.is_empty()));
    }

    #[test]
    fn test_first_pod_text_is_positional() {
        let result = france();
        assert_ne!(result.pods[0].id, "Result");
        assert_eq!(first_pod_text(&result), Lookup::Found("France | population".to_string()));
    }

    #[test]
    fn test_first_pod_text_not_found() {
        let empty = parse_response(r#"{"queryresult": {"success": true, "pods": []}}"#)
            .unwrap()
            .result;
        assert_eq!(first_pod_text(&empty), Lookup::NotFound);

        let image_only = parse_response(
            r#"{"queryresult": {"success": true, "pods": [{"title": "Plot", "id": "Plot", "subpods": [{}]}]}}"#,
        )
        .unwrap()
        .result;
        assert_eq!(first_pod_text(&image_only), Lookup::NotFound);
    }

    #[test]
    fn test_failure_surfaces_provider_text() {
        let failed = parse_response(
            r#"{"queryresult": {"success": false, "error": {"msg": "Appid missing"}}}"#,
        )
        .unwrap()
        .result;
        assert_eq!(first_pod_text(&failed), Lookup::ProviderFailure("Appid missing".to_string()));
        assert_eq!(pod_text(&failed, "Result"), Lookup::ProviderFailure("Appid missing".to_string()));
    }

    #[test]
    fn test_pod_text_by_id() {
        let result = france();
        assert_eq!(
            pod_text(&result, "Result"),
            Lookup::Found("68.5 million people (world rank: 20th) (2023 estimate)".to_string())
        );
        assert_eq!(pod_text(&result, "NonexistentPodId"), Lookup::NotFound);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let result = france();
        assert_eq!(all_pods_as_map(&result), all_pods_as_map(&result));
        assert_eq!(first_pod_text(&result), first_pod_text(&result));
    }

    #[test]
    fn test_lookup_into_result() {
        assert_eq!(Lookup::Found(1).into_result("x").unwrap(), 1);
        assert!(matches!(
            Lookup::<i32>::NotFound.into_result("pod Result"),
            Err(WolframError::NotFound(_))
        ));
        assert!(matches!(
            Lookup::<i32>::ProviderFailure("nope".into()).into_result("x"),
            Err(WolframError::ProviderFailure(_))
        ));
    }

    #[test]
    fn test_render_sections() {
        let mut map = PodMap::new();
        map.insert("Result (Result)".to_string(), vec!["4".to_string()]);

        let numbered = render_sections("Query: 2+2", &map, true);
        assert!(numbered.starts_with("Query: 2+2\n\n"));
        assert!(numbered.contains("Result (Result):\n"));
        assert!(numbered.contains("1. 4\n"));

        let plain = render_sections("Query: 2+2", &map, false);
        assert!(plain.contains("\n4\n"));
        assert!(!plain.contains("1. 4"));
    }
}
