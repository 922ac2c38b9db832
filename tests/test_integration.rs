//! End-to-end tests: plugin source in, loaded plugin out.

extern crate playground;

mod common;

use serde_json::json;

use common::Harness;
use playground::runner::ds::object::object_from_entries;
use playground::runner::ds::operations::object::get_own;
use playground::runner::ds::value::JsValue;
use playground::runner::plugin::{
    CdnPolicy, ConsentDecision, DocumentModel, PluginLoadError, PluginLoader, ResolveError,
    ResolverOptions, SettingsStore,
};
use playground::TranspileError;

async fn load(loader: &PluginLoader, source: &str) -> JsValue {
    match loader.load(source).await {
        Ok(plugin) => plugin.default_export,
        Err(e) => panic!("loading failed: {}", e),
    }
}

#[tokio::test]
async fn test_default_export_expression() {
    let loader = PluginLoader::new(ResolverOptions::new().build());
    assert_eq!(load(&loader, "export default 1 + 1;").await, JsValue::from(2));
}

#[tokio::test]
async fn test_missing_default_export() {
    let loader = PluginLoader::new(ResolverOptions::new().build());
    assert!(matches!(
        loader.load("export const a = 1;").await,
        Err(PluginLoadError::Transpile(TranspileError::MissingDefaultExport))
    ));
}

#[tokio::test]
async fn test_local_json_import() {
    let h = Harness::new(CdnPolicy::Never)
        .with_documents(vec![("/work/a", DocumentModel::json(json!({ "x": 5 })))]);
    let loader = PluginLoader::new(h.resolver());
    assert_eq!(
        load(&loader, "import { x } from './a'; export default x;").await,
        JsValue::from(5)
    );
}

#[tokio::test]
async fn test_typescript_plugin_with_known_module() {
    let app = object_from_entries(vec![("version", JsValue::from("4.0"))]);
    let h = Harness::new(CdnPolicy::Never);
    let loader = PluginLoader::new(
        h.options("/work/plugin.ts")
            .known_module("@host/app", app)
            .token("@host/app", "IShell", JsValue::from("shell-token"))
            .build(),
    );

    let source = r#"
        import { IShell, version } from '@host/app';
        import type { Options } from '@host/types';

        interface Activated {
            id: string;
        }

        const plugin = {
            id: 'hello:plugin',
            autoStart: true,
            requires: [IShell],
            activate: (app: any, opts?: Options): Activated => ({ id: `hello ${version}` }),
        };

        export default plugin;
    "#;
    let plugin = loader.load(source).await.unwrap();
    assert_eq!(plugin.plugins.len(), 1);
    assert_eq!(get_own(&plugin.default_export, "id"), Some(JsValue::from("hello:plugin")));

    let requires = get_own(&plugin.default_export, "requires").unwrap();
    assert_eq!(get_own(&requires, "0"), Some(JsValue::from("shell-token")));
    assert_eq!(plugin.imports.len(), 3);
    assert!(plugin.imports[2].is_type_only);
}

#[tokio::test]
async fn test_plugin_list() {
    let loader = PluginLoader::new(ResolverOptions::new().build());
    let plugin = loader
        .load("const a = { id: 'a' }; const b = { id: 'b' }; export default [a, b];")
        .await
        .unwrap();
    assert_eq!(plugin.plugins.len(), 2);
    assert_eq!(get_own(&plugin.plugins[1], "id"), Some(JsValue::from("b")));
}

#[tokio::test]
async fn test_named_exports_are_kept() {
    let loader = PluginLoader::new(ResolverOptions::new().build());
    let plugin = loader
        .load("export const helper = 3; export default helper * 2;")
        .await
        .unwrap();
    assert_eq!(get_own(&plugin.exports, "helper"), Some(JsValue::from(3)));
    assert_eq!(plugin.default_export, JsValue::from(6));
}

#[tokio::test]
async fn test_import_failure_can_be_caught() {
    let h = Harness::new(CdnPolicy::Never);
    let loader = PluginLoader::new(h.resolver());

    let source = r#"
        let status = 'loaded';
        try {
            require('left-pad');
        } catch (e) {
            status = e.name;
        }
        export default status;
    "#;
    assert_eq!(load(&loader, source).await, JsValue::from("ImportError"));
    assert_eq!(h.reporter.count(), 1);
}

#[tokio::test]
async fn test_uncaught_import_failure() {
    let h = Harness::new(CdnPolicy::Never);
    let loader = PluginLoader::new(h.resolver());

    let err = loader
        .load("import { pad } from 'left-pad'; export default pad;")
        .await
        .err()
        .unwrap();
    match err {
        PluginLoadError::Import(e) => {
            assert!(matches!(*e, ResolveError::ConsentDenied { ref module } if module == "left-pad"))
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(h.reporter.count(), 1);
}

#[tokio::test]
async fn test_cdn_import_after_consent() {
    let lodash = object_from_entries(vec![("VERSION", JsValue::from("4.17.21"))]);
    let h = Harness::new(CdnPolicy::AwaitingDecision)
        .with_decisions(vec![ConsentDecision::Allow])
        .with_remote(vec![("lodash", lodash)]);
    let loader = PluginLoader::new(h.resolver());

    let source = "import * as lodash from 'lodash'; export default lodash.VERSION;";
    assert_eq!(load(&loader, source).await, JsValue::from("4.17.21"));
    assert_eq!(load(&loader, source).await, JsValue::from("4.17.21"));
    assert_eq!(h.dialog.times_asked(), 1);
    assert_eq!(h.settings.composite().allow_cdn, CdnPolicy::AlwaysInsecure);
}

#[tokio::test]
async fn test_local_script_module_chain() {
    let h = Harness::new(CdnPolicy::Never).with_documents(vec![
        (
            "/work/lib/greet.ts",
            DocumentModel::text(
                "import { suffix } from '../config.json';\n\
                 export function greet(name: string): string { return `hi ${name}${suffix}`; }",
            ),
        ),
        ("/work/config.json", DocumentModel::json(json!({ "suffix": "!" }))),
    ]);
    let loader = PluginLoader::new(h.resolver());

    let source = "import { greet } from './lib/greet'; export default greet('ada');";
    // `./lib/greet` has no extension, so the `.ts` document is not found.
    assert!(loader.load(source).await.is_err());

    let source = "import { greet } from './lib/greet.ts'; export default greet('ada');";
    assert_eq!(load(&loader, source).await, JsValue::from("hi ada!"));
}
