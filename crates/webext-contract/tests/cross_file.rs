mod common;

use common::{wrapped, Fixture, WRAPPER_PACKAGE};
use webext_contract::{
    synthesize_members, FsImportResolver, ImportSource, MemberSignature, SynthesizeOptions,
};

#[test]
fn imported_interfaces_and_aliases_are_inlined() {
    let fixture = Fixture::new()
        .with(
            "types.ts",
            r#"
                export interface Options { id: string; retries?: number }
                type Mode = "fast" | "slow";
                export { Mode as RunMode };
            "#,
        )
        .with(
            "service.ts",
            r#"
                import type { Options, RunMode } from "./types";
                export default {
                    configure(options: Options): RunMode { return "fast"; },
                };
            "#,
        );
    insta::assert_snapshot!(
        fixture.contract("service.ts").unwrap(),
        @r#"{ configure(options: {id: string; retries?: number;}): "fast" | "slow"; }"#
    );
}

#[test]
fn package_types_use_the_external_form() {
    let fixture = Fixture::new().with(
        "service.ts",
        r#"
            import type { Tabs } from "webextension-polyfill";
            import * as Browser from "webextension-polyfill";
            export default {
                query(): Promise<Tabs.Tab[]> { return null as any; },
                runtime(): Browser.Runtime.Static { return null as any; },
                current(): Tabs { return null as any; },
            };
        "#,
    );
    let rendered = fixture.contract("service.ts").unwrap();
    assert!(
        rendered.contains(r#"current(): import("webextension-polyfill").Tabs;"#),
        "{rendered}"
    );
}

#[test]
fn base_classes_are_followed_across_files() {
    let fixture = Fixture::new()
        .with(
            "base.ts",
            r#"
                export class Base {
                    id = "base";
                    protected token = "t";
                    ping(): boolean { return true; }
                    describe(): string { return this.id; }
                }
            "#,
        )
        .with(
            "service.ts",
            r#"
                import { Base } from "./base";
                export default class Service extends Base {
                    describe(): string { return "service"; }
                    extra = 1;
                }
            "#,
        );
    insta::assert_snapshot!(
        fixture.contract("service.ts").unwrap(),
        @"{ id: string; ping(): boolean; describe(): string; extra: number; }"
    );
}

#[test]
fn default_exported_classes_are_instantiated_across_files() {
    let fixture = Fixture::new()
        .with(
            "store.ts",
            r#"
                export default class Store {
                    count = 0;
                    static create() { return new Store(); }
                    increment(): void { this.count++; }
                }
            "#,
        )
        .with(
            "background.ts",
            &format!(
                r#"
                    import {{ defineProxyService }} from "{WRAPPER_PACKAGE}";
                    import Store from "./store";
                    export default defineProxyService(() => new Store());
                "#
            ),
        );
    assert_eq!(
        fixture.synthesize("background.ts", &wrapped()).as_deref(),
        Some("{ count: number; increment(): void; }")
    );
}

#[test]
fn re_exported_identifiers_resolve_to_their_values() {
    let fixture = Fixture::new()
        .with(
            "api.ts",
            r#"
                const api = { version: 2, list(): string[] { return []; } };
                export { api as publicApi };
            "#,
        )
        .with(
            "index.ts",
            r#"
                import { publicApi } from "./api";
                export default publicApi;
            "#,
        );
    assert_eq!(
        fixture.contract("index.ts").as_deref(),
        Some("{ version: number; list(): string[]; }")
    );
}

#[test]
fn circular_aliases_terminate() {
    let fixture = Fixture::new()
        .with(
            "a.ts",
            r#"
                import type { B } from "./b";
                export type A = { b: B };
            "#,
        )
        .with(
            "b.ts",
            r#"
                import type { A } from "./a";
                export type B = { a: A };
            "#,
        )
        .with(
            "entry.ts",
            r#"
                import type { A } from "./a";
                export default { get(): A { return null as any; } };
            "#,
        );
    insta::assert_snapshot!(
        fixture.contract("entry.ts").unwrap(),
        @r#"{ get(): {b: {a: import("./a").A;};}; }"#
    );
}

#[test]
fn circular_class_hierarchies_terminate() {
    let fixture = Fixture::new()
        .with(
            "a.ts",
            r#"
                import { B } from "./b";
                export class A extends B { fromA = 1; }
            "#,
        )
        .with(
            "b.ts",
            r#"
                import { A } from "./a";
                export class B extends A { fromB = "b"; }
            "#,
        )
        .with(
            "entry.ts",
            r#"
                import { A } from "./a";
                export default () => new A();
            "#,
        );
    let rendered = fixture.contract("entry.ts").unwrap();
    assert!(rendered.contains("fromA: number;"), "{rendered}");
}

#[test]
fn missing_import_targets_degrade() {
    let fixture = Fixture::new().with(
        "entry.ts",
        r#"
            import { Base } from "./does-not-exist";
            import type { Shape } from "./does-not-exist";
            export default class Service extends Base {
                draw(shape: Shape): void {}
            }
        "#,
    );
    insta::assert_snapshot!(
        fixture.contract("entry.ts").unwrap(),
        @r#"{ draw(shape: import("./does-not-exist").Shape): void; }"#
    );
}

#[test]
fn path_aliases_are_resolved() {
    let fixture = Fixture::new()
        .with("src/shared/types.ts", "export type Id = string;")
        .with(
            "src/entry.ts",
            r#"
                import type { Id } from "@/shared/types";
                export default { lookup(id: Id): boolean { return true; } };
            "#,
        );
    let resolver =
        FsImportResolver::new().with_aliases([("@/".to_string(), fixture.path("src"))]);
    let rendered = webext_contract::synthesize(
        fixture.path("src/entry.ts"),
        &SynthesizeOptions::default(),
        &resolver,
    )
    .unwrap();
    assert_eq!(rendered.as_deref(), Some("{ lookup(id: string): boolean; }"));
}

#[test]
fn custom_resolvers_can_mark_everything_external() {
    let fixture = Fixture::new()
        .with("types.ts", "export type Id = string;")
        .with(
            "entry.ts",
            r#"
                import type { Id } from "./types";
                export default { lookup(id: Id): void {} };
            "#,
        );
    let resolver = |specifier: &str, _: &std::path::Path| {
        ImportSource::Package(format!("virtual:{specifier}"))
    };
    let rendered = webext_contract::synthesize(
        fixture.path("entry.ts"),
        &SynthesizeOptions::default(),
        &resolver,
    )
    .unwrap();
    assert_eq!(
        rendered.as_deref(),
        Some(r#"{ lookup(id: import("virtual:./types").Id): void; }"#)
    );
    assert!(fixture.root().join("types.ts").exists());
}

#[test]
fn structured_members_are_available() {
    let fixture = Fixture::new().with(
        "service.ts",
        "export default { ready: true, start(delay?: number): void {} };",
    );
    let members = synthesize_members(
        fixture.path("service.ts"),
        &SynthesizeOptions::default(),
        &FsImportResolver::new(),
    )
    .unwrap()
    .unwrap();
    assert_eq!(members.keys().collect::<Vec<_>>(), ["ready", "start"]);
    match &members["start"] {
        MemberSignature::Method(method) => {
            assert_eq!(method.parameters.len(), 1);
            assert!(method.parameters[0].optional);
            assert_eq!(method.return_type, "void");
        }
        other => panic!("expected a method, got {other:?}"),
    }
    assert_eq!(
        serde_json::to_value(&members).unwrap(),
        serde_json::json!({
            "ready": { "kind": "property", "type": "boolean", "optional": false },
            "start": {
                "kind": "method",
                "parameters": [{ "name": "delay", "type": "number", "optional": true }],
                "return_type": "void"
            }
        })
    );
}
