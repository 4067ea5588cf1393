//! End-to-end ResourceList runs through the library entry point

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_yaml::Value;
use setimg_core::EngineConfig;
use setimg_fn::{process, ResourceList};
use setimg_test_utils::{config_map_value, resource_list_yaml, ManifestBuilder};

fn typed_config(rule: &str) -> Value {
    serde_yaml::from_str(&format!(
        "apiVersion: fn.kpt.dev/v1alpha1\nkind: SetImageFromConfigMap\nmetadata:\n  name: set-image\nsetImageInfo:\n{rule}"
    ))
    .unwrap()
}

fn workloads() -> Vec<Value> {
    vec![
        ManifestBuilder::new("apps/v1", "Deployment", "web")
            .namespace("prod")
            .file("web.yaml", 0)
            .init_container("init", "busybox:1.36")
            .container("app", "docker.io/nginx:1.20.2")
            .build_value(),
        ManifestBuilder::new("batch/v1", "CronJob", "nightly")
            .file("jobs.yaml", 0)
            .container("job", "nginx")
            .build_value(),
        ManifestBuilder::new("v1", "Pod", "debug")
            .file("jobs.yaml", 1)
            .container("shell", "busybox")
            .build_value(),
    ]
}

fn run(items: &[Value], config: Option<Value>) -> ResourceList {
    let input = resource_list_yaml(items, config);
    process(ResourceList::from_yaml(&input).unwrap(), EngineConfig::new()).unwrap()
}

fn messages(list: &ResourceList) -> Vec<String> {
    list.results
        .iter()
        .map(|r| r["message"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn inline_rule_rewrites_every_catalog_location() {
    let out = run(
        &workloads(),
        Some(typed_config("  name: nginx\n  newRegistry: mirror.local\n  newTag: 1.21.6\n")),
    );

    assert_eq!(
        messages(&out),
        vec![
            "set image from docker.io/nginx:1.20.2 to mirror.local/nginx:1.21.6",
            "set image from nginx to mirror.local/nginx:1.21.6",
        ]
    );
    let cron = out.items[1].tree();
    assert_eq!(
        cron["spec"]["jobTemplate"]["spec"]["template"]["spec"]["containers"][0]["image"].as_str(),
        Some("mirror.local/nginx:1.21.6")
    );
    assert!(!out.has_errors());
}

#[test]
fn results_carry_provenance() {
    let out = run(&workloads(), Some(typed_config("  name: busybox\n  newTag: '1.37'\n")));

    let first = &out.results[0];
    assert_eq!(first["resourceRef"]["kind"].as_str(), Some("Deployment"));
    assert_eq!(first["resourceRef"]["namespace"].as_str(), Some("prod"));
    assert_eq!(first["file"]["path"].as_str(), Some("web.yaml"));
    assert_eq!(first["field"]["path"].as_str(), Some("spec.template.spec.initContainers[0].image"));
    assert_eq!(first["field"]["currentValue"].as_str(), Some("busybox:1.36"));
    assert_eq!(first["field"]["proposedValue"].as_str(), Some("busybox:1.37"));
    assert_eq!(first["severity"].as_str(), Some("info"));

    let second = &out.results[1];
    assert_eq!(second["resourceRef"]["kind"].as_str(), Some("Pod"));
    assert_eq!(second["file"]["index"].as_u64(), Some(1));
}

#[test]
fn rule_from_referenced_config_map() {
    let mut items = workloads();
    items.push(config_map_value("image-rules", &[("name", "busybox"), ("newName", "alpine")]));
    let config = config_map_value("fn-config", &[("name", "image-rules")]);

    let out = run(&items, Some(config));
    assert_eq!(
        messages(&out),
        vec![
            "set image from busybox:1.36 to alpine:1.36",
            "set image from busybox to alpine",
        ]
    );
    // The config map itself is carried through.
    assert_eq!(out.items.len(), 4);
    assert_eq!(out.items[3].tree(), &items[3]);
}

#[test]
fn unquoted_decimal_tag_is_reported_not_truncated() {
    let pod = ManifestBuilder::new("v1", "Pod", "web")
        .container("app", "nginx:1.19")
        .build_value();
    let rules: Value = serde_yaml::from_str(
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: image-rules\ndata:\n  name: nginx\n  newTag: 1.20\n",
    )
    .unwrap();
    let items = vec![pod, rules];
    let out = run(&items, Some(config_map_value("fn-config", &[("name", "image-rules")])));

    assert!(out.has_errors());
    assert_eq!(out.results.len(), 1);
    assert!(messages(&out)[0].contains("quote the value"), "{:?}", messages(&out));
    assert_eq!(out.items[0].tree(), &items[0]);
}

#[test]
fn unquoted_integer_tag_in_inline_rule() {
    let pod = ManifestBuilder::new("v1", "Pod", "web")
        .container("app", "nginx:1")
        .build_value();
    let out = run(&[pod], Some(typed_config("  name: nginx\n  newTag: 2\n")));

    assert!(!out.has_errors());
    assert_eq!(messages(&out), vec!["set image from nginx:1 to nginx:2"]);
}

#[test]
fn missing_config_map_is_a_noop() {
    let config = config_map_value("fn-config", &[("name", "absent")]);
    let items = workloads();
    let out = run(&items, Some(config));

    assert_eq!(messages(&out), vec!["no images changed"]);
    let trees: Vec<_> = out.items.iter().map(|r| r.tree().clone()).collect();
    assert_eq!(trees, items);
}

#[test]
fn unsupported_config_reports_error_and_keeps_items() {
    let items = workloads();
    let config: Value = serde_yaml::from_str("apiVersion: v1\nkind: Secret\nmetadata:\n  name: creds\n").unwrap();
    let out = run(&items, Some(config));

    assert_eq!(out.results.len(), 1);
    assert_eq!(out.results[0]["severity"].as_str(), Some("error"));
    assert_eq!(out.results[0]["resourceRef"]["name"].as_str(), Some("creds"));
    assert!(out.has_errors());
    assert_eq!(out.items.len(), items.len());
    assert_eq!(out.items[0].tree(), &items[0]);
}

#[test]
fn missing_function_config_reports_error() {
    let out = run(&workloads(), None);
    assert_eq!(out.results.len(), 1);
    assert!(out.has_errors());
    assert!(out.results[0].get("resourceRef").is_none());
}

#[test]
fn invalid_image_fails_the_run() {
    let items = vec![
        ManifestBuilder::new("apps/v1", "Deployment", "ok")
            .container("app", "nginx")
            .build_value(),
        ManifestBuilder::new("apps/v1", "Deployment", "broken")
            .container("app", "")
            .build_value(),
    ];
    let input = resource_list_yaml(&items, Some(typed_config("  name: nginx\n  newTag: '2'\n")));
    let err = process(ResourceList::from_yaml(&input).unwrap(), EngineConfig::new()).unwrap_err();
    assert!(err.to_string().contains("broken"), "{err}");
}

#[test]
fn existing_results_are_kept_first() {
    let input = format!(
        "{}results:\n- message: from an earlier function\n  severity: warning\n",
        resource_list_yaml(&workloads(), Some(typed_config("  name: nginx\n  newTag: '2'\n")))
    );
    let out = process(ResourceList::from_yaml(&input).unwrap(), EngineConfig::new()).unwrap();
    assert_eq!(messages(&out)[0], "from an earlier function");
    assert_eq!(out.results.len(), 3);
}

#[test]
fn output_is_stable_across_runs_and_modes() {
    let input = resource_list_yaml(&workloads(), Some(typed_config("  name: nginx\n  newTag: '2'\n")));
    let seq = process(ResourceList::from_yaml(&input).unwrap(), EngineConfig::new()).unwrap();
    let again = process(ResourceList::from_yaml(&input).unwrap(), EngineConfig::new()).unwrap();
    let par = process(
        ResourceList::from_yaml(&input).unwrap(),
        EngineConfig::new().with_parallel(true),
    )
    .unwrap();

    let yaml = seq.to_yaml().unwrap();
    assert_eq!(yaml, again.to_yaml().unwrap());
    assert_eq!(yaml, par.to_yaml().unwrap());
}

proptest! {
    #[test]
    fn prop_unmatched_names_leave_items_alone(name in "[A-Z]{3,8}") {
        let items = workloads();
        let config = typed_config(&format!("  name: '{name}'\n  newTag: x\n"));
        let out = run(&items, Some(config));

        let trees: Vec<_> = out.items.iter().map(|r| r.tree().clone()).collect();
        prop_assert_eq!(trees, items);
        prop_assert_eq!(messages(&out), vec!["no images changed".to_string()]);
    }
}
