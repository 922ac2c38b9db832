//! Tests for the plugin transpiler's public surface.

extern crate playground;

use std::rc::Rc;

use futures::executor::block_on;

use playground::compiler::PluginTranspiler;
use playground::runner::ds::operations::object::get_own;
use playground::runner::ds::value::JsValue;
use playground::runner::{NoopRequire, Sandbox};
use playground::{ImportStatement, TranspileError};

fn run(body: &str) -> JsValue {
    block_on(Sandbox::new().execute(body, Rc::new(NoopRequire))).unwrap()
}

#[test]
fn test_default_export_survives_execution() {
    let mut transpiler = PluginTranspiler::new();
    let body = transpiler
        .transpile("const answer: number = 40; export default answer + 2;", true)
        .unwrap();
    assert_eq!(transpiler.default_export(), Some("answer + 2"));
    assert_eq!(get_own(&run(&body), "default"), Some(JsValue::from(42)));
}

#[test]
fn test_default_export_requirement() {
    let mut transpiler = PluginTranspiler::new();
    assert!(matches!(
        transpiler.transpile("export const a = 1;", true),
        Err(TranspileError::MissingDefaultExport)
    ));
    let body = transpiler.transpile("export const a = 1;", false).unwrap();
    assert_eq!(get_own(&run(&body), "a"), Some(JsValue::from(1)));
}

#[test]
fn test_type_declarations_are_erased() {
    let mut transpiler = PluginTranspiler::new();
    let body = transpiler
        .transpile(
            "type Id = string;\n\
             interface Plugin { id: Id }\n\
             const p = { id: 'x' } as Plugin;\n\
             export default p!.id;",
            true,
        )
        .unwrap();
    assert!(!body.contains("interface"));
    assert_eq!(get_own(&run(&body), "default"), Some(JsValue::from("x")));
}

#[test]
fn test_default_exported_interface_is_erased() {
    let mut transpiler = PluginTranspiler::new();
    let source = "export default interface Settings { id: string }\nexport const ready = true;";
    assert!(matches!(
        transpiler.transpile(source, true),
        Err(TranspileError::MissingDefaultExport)
    ));

    let body = transpiler.transpile(source, false).unwrap();
    assert_eq!(transpiler.default_export(), None);
    assert!(transpiler.diagnostics().is_empty());
    assert!(!body.contains("interface"));
    let exports = run(&body);
    assert_eq!(get_own(&exports, "default"), None);
    assert_eq!(get_own(&exports, "ready"), Some(JsValue::Boolean(true)));
}

#[test]
fn test_optional_chains_survive_transpilation() {
    let mut transpiler = PluginTranspiler::new();
    let body = transpiler
        .transpile(
            "const hooks: any = { start: () => 'started' };\n\
             export default [hooks.start?.(), hooks.stop?.(), hooks?.['start']?.()];",
            true,
        )
        .unwrap();
    let plugin = get_own(&run(&body), "default").unwrap();
    assert_eq!(get_own(&plugin, "0"), Some(JsValue::from("started")));
    assert_eq!(get_own(&plugin, "1"), Some(JsValue::Undefined));
    assert_eq!(get_own(&plugin, "2"), Some(JsValue::from("started")));
}

#[test]
fn test_import_descriptors() {
    let mut transpiler = PluginTranspiler::new();
    transpiler
        .transpile(
            "import React, { useState as useS } from 'react';\n\
             import * as path from 'path';\n\
             export default 1;",
            true,
        )
        .unwrap();
    assert_eq!(
        transpiler.imports(),
        &[
            ImportStatement::default_import("react", "React"),
            ImportStatement::named("react", "useState").with_alias("useS"),
            ImportStatement::whole("path", "path"),
        ]
    );
}

#[test]
fn test_export_assignment_diagnostic() {
    let mut transpiler = PluginTranspiler::new();
    transpiler.transpile("const a = 1; export = a;", false).unwrap();
    let diagnostics = transpiler.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].message.contains("`export =`"));
    assert!(diagnostics[0].start < diagnostics[0].end);
}
