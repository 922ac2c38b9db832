//! Tests for import resolution and the CDN consent flow.

extern crate playground;

mod common;

use serde_json::json;

use common::Harness;
use playground::runner::ds::object::object_from_entries;
use playground::runner::ds::operations::object::{get_own, own_keys};
use playground::runner::ds::value::JsValue;
use playground::runner::plugin::{
    CdnPolicy, ConsentDecision, DocumentModel, ImportStatement, ResolveError, SettingsError,
    SettingsStore,
};

fn module_ab() -> JsValue {
    object_from_entries(vec![("a", JsValue::from(1)), ("b", JsValue::from(2))])
}

// ============================================================================
// Tokens and known modules
// ============================================================================

mod known_module_tests {
    use super::*;

    #[tokio::test]
    async fn test_token_wins_over_known_module_attribute() {
        let h = Harness::new(CdnPolicy::Never);
        let resolver = h
            .options("/work/plugin.ts")
            .known_module("m", module_ab())
            .token("m", "a", JsValue::from("token"))
            .build();

        let a = resolver
            .resolve_import(&ImportStatement::named("m", "a"))
            .await
            .unwrap();
        assert_eq!(a, JsValue::from("token"));

        let whole = resolver.resolve("m").await.unwrap();
        assert_eq!(get_own(&whole, "a"), Some(JsValue::from("token")));
        assert_eq!(get_own(&whole, "b"), Some(JsValue::from(2)));
        assert_eq!(own_keys(&whole), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_attribute_does_not_fall_through() {
        let h = Harness::new(CdnPolicy::AlwaysInsecure)
            .with_remote(vec![("m", object_from_entries(vec![("c", JsValue::from(3))]))]);
        let resolver = h
            .options("/work/plugin.ts")
            .known_module("m", module_ab())
            .build();

        let err = resolver
            .resolve_import(&ImportStatement::named("m", "c"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MissingAttribute { ref module, ref attribute } if module == "m" && attribute == "c"
        ));
        assert!(h.remote.fetched().is_empty());
        assert_eq!(h.reporter.count(), 1);
    }

    #[tokio::test]
    async fn test_default_import_falls_back_to_whole_module() {
        let h = Harness::new(CdnPolicy::Never);
        let with_default = object_from_entries(vec![("default", JsValue::from("d"))]);
        let resolver = h
            .options("/work/plugin.ts")
            .known_module("with-default", with_default)
            .known_module("plain", module_ab())
            .build();

        let d = resolver
            .resolve_import(&ImportStatement::default_import("with-default", "d"))
            .await
            .unwrap();
        assert_eq!(d, JsValue::from("d"));

        let plain = resolver
            .resolve_import(&ImportStatement::default_import("plain", "p"))
            .await
            .unwrap();
        assert_eq!(get_own(&plain, "b"), Some(JsValue::from(2)));
    }

    #[tokio::test]
    async fn test_type_only_imports_resolve_to_undefined() {
        let h = Harness::new(CdnPolicy::AwaitingDecision);
        let resolver = h.resolver();
        let import = ImportStatement::named("types-only", "T").with_type_only(true);
        assert_eq!(
            resolver.resolve_import(&import).await.unwrap(),
            JsValue::Undefined
        );
        assert_eq!(h.dialog.times_asked(), 0);
        assert_eq!(h.reporter.count(), 0);
    }

    #[tokio::test]
    async fn test_tokens_alone_provide_a_module() {
        let h = Harness::new(CdnPolicy::Never);
        let resolver = h
            .options("/work/plugin.ts")
            .token("@host/app", "IApp", JsValue::from("app-token"))
            .build();

        let app = resolver.resolve("@host/app").await.unwrap();
        assert_eq!(get_own(&app, "IApp"), Some(JsValue::from("app-token")));
        assert!(h.remote.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_tokens_of_a_colon_named_module_stay_with_it() {
        let h = Harness::new(CdnPolicy::Never);
        let resolver = h
            .options("/work/plugin.ts")
            .token("host:app", "IApp", JsValue::from("app-token"))
            .build();

        let err = resolver.resolve("host").await.unwrap_err();
        assert!(matches!(err, ResolveError::ConsentDenied { ref module } if module == "host"));

        let app = resolver.resolve("host:app").await.unwrap();
        assert_eq!(get_own(&app, "IApp"), Some(JsValue::from("app-token")));
    }
}

// ============================================================================
// Local files
// ============================================================================

mod local_file_tests {
    use super::*;

    #[tokio::test]
    async fn test_json_document() {
        let h = Harness::new(CdnPolicy::Never)
            .with_documents(vec![("/work/a", DocumentModel::json(json!({ "x": 5 })))]);
        let resolver = h.resolver();

        let x = resolver
            .resolve_import(&ImportStatement::named("./a", "x"))
            .await
            .unwrap();
        assert_eq!(x, JsValue::from(5));
        assert_eq!(*h.documents.requested.borrow(), vec!["/work/a".to_string()]);
    }

    #[tokio::test]
    async fn test_script_document_is_compiled_and_run() {
        let h = Harness::new(CdnPolicy::Never).with_documents(vec![
            (
                "/work/lib/math.ts",
                DocumentModel::text(
                    "import { base } from './base.json';\n\
                     export function double(n: number): number { return n * 2 + base; }\n\
                     export const name = 'math';",
                ),
            ),
            ("/work/lib/base.json", DocumentModel::json(json!({ "base": 1 }))),
        ]);
        let resolver = h.resolver();

        let module = resolver.resolve("./lib/math.ts").await.unwrap();
        assert_eq!(get_own(&module, "name"), Some(JsValue::from("math")));
        assert!(get_own(&module, "double").map_or(false, |f| f.is_callable()));
    }

    #[tokio::test]
    async fn test_relative_to_parent_directory() {
        let h = Harness::new(CdnPolicy::Never)
            .with_documents(vec![("/shared/data.json", DocumentModel::json(json!([1, 2])))]);
        let resolver = h.options("/work/plugin.ts").build();

        let data = resolver.resolve("../shared/data.json").await.unwrap();
        assert!(data.is_array());
    }

    #[tokio::test]
    async fn test_missing_document() {
        let h = Harness::new(CdnPolicy::Never);
        let err = h.resolver().resolve("./missing").await.unwrap_err();
        assert!(matches!(err, ResolveError::Document { ref path, .. } if path == "/work/missing"));
        assert_eq!(h.reporter.count(), 1);
    }

    #[tokio::test]
    async fn test_missing_base_path_or_document_service() {
        let h = Harness::new(CdnPolicy::Never);
        let no_base = playground::runner::plugin::ResolverOptions::new()
            .documents(h.documents.clone())
            .reporter(h.reporter.clone())
            .build();
        assert!(matches!(
            no_base.resolve("./a").await,
            Err(ResolveError::Configuration(_))
        ));

        let no_documents = playground::runner::plugin::ResolverOptions::new()
            .base_path("/work/plugin.ts")
            .reporter(h.reporter.clone())
            .build();
        assert!(matches!(
            no_documents.resolve("./a").await,
            Err(ResolveError::Configuration(_))
        ));
        assert_eq!(h.reporter.count(), 2);
    }

    #[tokio::test]
    async fn test_circular_import_is_reported_once() {
        let h = Harness::new(CdnPolicy::Never).with_documents(vec![
            ("/work/a.js", DocumentModel::text("import { b } from './b.js'; export const a = b;")),
            ("/work/b.js", DocumentModel::text("import { a } from './a.js'; export const b = a;")),
        ]);
        let err = h.resolver().resolve("./a.js").await.unwrap_err();

        assert!(matches!(err, ResolveError::Nested { ref path, .. } if path == "/work/a.js"));
        assert_eq!(h.reporter.count(), 1);
        assert!(h
            .reporter
            .last_body()
            .map_or(false, |body| body.contains("circular import of `/work/a.js`")));
    }

    #[tokio::test]
    async fn test_failing_local_script() {
        let h = Harness::new(CdnPolicy::Never).with_documents(vec![(
            "/work/bad.js",
            DocumentModel::text("export const x = missing.y;"),
        )]);
        let err = h.resolver().resolve("./bad.js").await.unwrap_err();
        assert!(matches!(err, ResolveError::Module { ref path, .. } if path == "/work/bad.js"));
        assert_eq!(h.reporter.count(), 1);
    }
}

// ============================================================================
// CDN consent
// ============================================================================

mod consent_tests {
    use super::*;

    #[tokio::test]
    async fn test_never_policy_does_not_fetch() {
        let h = Harness::new(CdnPolicy::Never).with_remote(vec![("lodash", module_ab())]);
        let err = h.resolver().resolve("lodash").await.unwrap_err();

        assert!(matches!(err, ResolveError::ConsentDenied { ref module } if module == "lodash"));
        assert!(h.remote.fetched().is_empty());
        assert_eq!(h.dialog.times_asked(), 0);
        assert_eq!(h.reporter.count(), 1);
    }

    #[tokio::test]
    async fn test_allow_is_persisted_and_not_asked_again() {
        let h = Harness::new(CdnPolicy::AwaitingDecision)
            .with_decisions(vec![ConsentDecision::Allow])
            .with_remote(vec![("a", module_ab()), ("b", module_ab())]);
        let resolver = h.resolver();

        resolver.resolve("a").await.unwrap();
        assert_eq!(h.settings.composite().allow_cdn, CdnPolicy::AlwaysInsecure);
        resolver.resolve("b").await.unwrap();

        assert_eq!(h.dialog.times_asked(), 1);
        assert_eq!(h.remote.fetched(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            h.dialog.asked.borrow()[0],
            ("a".to_string(), "https://cdn.jsdelivr.net/npm/".to_string())
        );
    }

    #[tokio::test]
    async fn test_forbid_is_persisted() {
        let h = Harness::new(CdnPolicy::AwaitingDecision)
            .with_decisions(vec![ConsentDecision::Forbid])
            .with_remote(vec![("a", module_ab())]);
        let resolver = h.resolver();

        assert!(matches!(
            resolver.resolve("a").await,
            Err(ResolveError::ConsentDenied { .. })
        ));
        assert!(matches!(
            resolver.resolve("a").await,
            Err(ResolveError::ConsentDenied { .. })
        ));
        assert_eq!(h.settings.composite().allow_cdn, CdnPolicy::Never);
        assert_eq!(h.dialog.times_asked(), 1);
        assert!(h.remote.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_abort_keeps_awaiting_decision() {
        let h = Harness::new(CdnPolicy::AwaitingDecision)
            .with_decisions(vec![ConsentDecision::Abort, ConsentDecision::Abort])
            .with_remote(vec![("a", module_ab())]);
        let resolver = h.resolver();

        let err = resolver.resolve("a").await.unwrap_err();
        assert!(matches!(err, ResolveError::ConsentAborted { ref module } if module == "a"));
        assert_eq!(h.settings.composite().allow_cdn, CdnPolicy::AwaitingDecision);

        // Nothing was persisted, so the next resolution asks again.
        assert!(resolver.resolve("a").await.is_err());
        assert_eq!(h.dialog.times_asked(), 2);
        assert!(h.remote.fetched().is_empty());
        assert_eq!(h.reporter.count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_resolutions_prompt_once() {
        let h = Harness::new(CdnPolicy::AwaitingDecision)
            .with_decisions(vec![ConsentDecision::Allow])
            .with_remote(vec![("a", module_ab()), ("b", module_ab())]);
        let first = h.resolver();
        let second = first.clone();

        let (a, b) = futures::join!(first.resolve("a"), second.resolve("b"));
        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(h.dialog.times_asked(), 1);
    }

    #[tokio::test]
    async fn test_unpack_selects_attribute() {
        let h = Harness::new(CdnPolicy::AlwaysInsecure).with_remote(vec![("m", module_ab())]);
        let resolver = h.resolver();

        let a = resolver
            .resolve_import(&ImportStatement::named("m", "a"))
            .await
            .unwrap();
        assert_eq!(a, JsValue::from(1));
        let missing = resolver
            .resolve_import(&ImportStatement::named("m", "zzz"))
            .await
            .unwrap();
        assert_eq!(missing, JsValue::Undefined);
        let whole = resolver
            .resolve_import(&ImportStatement::whole("m", "ns"))
            .await
            .unwrap();
        assert_eq!(get_own(&whole, "b"), Some(JsValue::from(2)));
    }

    #[tokio::test]
    async fn test_fetch_failure() {
        let h = Harness::new(CdnPolicy::AlwaysInsecure);
        let err = h.resolver().resolve("nowhere").await.unwrap_err();
        assert!(matches!(err, ResolveError::Fetch { ref module, .. } if module == "nowhere"));
        assert_eq!(h.remote.fetched(), vec!["nowhere".to_string()]);
    }

    #[tokio::test]
    async fn test_unresolved_without_remote_loader() {
        let h = Harness::new(CdnPolicy::AwaitingDecision);
        let resolver = playground::runner::plugin::ResolverOptions::new()
            .settings(h.settings.clone())
            .dialog(h.dialog.clone())
            .reporter(h.reporter.clone())
            .build();

        let err = resolver.resolve("left-pad").await.unwrap_err();
        assert_eq!(err.to_string(), "could not resolve module `left-pad`");
        assert_eq!(h.dialog.times_asked(), 0);
        assert_eq!(
            h.reporter.last_body(),
            Some("Importing `left-pad` failed: could not resolve module `left-pad`".to_string())
        );
    }

    #[test]
    fn test_not_persisted_error_message() {
        let err = ResolveError::from(SettingsError::NotPersisted);
        assert_eq!(
            err.to_string(),
            "failed to persist the CDN policy: the CDN policy was written but did not persist"
        );
    }
}
