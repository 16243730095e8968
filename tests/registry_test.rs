//! Registry behaviour across the register and render phases

use octoform::adapters::hcl::HclWriter;
use octoform::core::registry::{RenderContext, ResourceDescriptor, ResourceRegistry};
use octoform::domain::ResourceKind;
use std::sync::Arc;

fn environment(id: &str, label: &str) -> ResourceDescriptor {
    ResourceDescriptor::new(
        ResourceKind::Environments,
        id,
        format!("${{octopusdeploy_environment.{label}.id}}"),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_one_winner() {
    let registry = Arc::new(ResourceRegistry::new());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                match registry.claim(ResourceKind::Environments, "Environments-1") {
                    Some(claim) => {
                        claim
                            .register(environment("Environments-1", "production"))
                            .unwrap();
                        true
                    }
                    None => false,
                }
            })
        })
        .collect();

    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_render_resolves_entities_registered_later() {
    let registry = ResourceRegistry::new();

    // the lifecycle is registered before the environment it references
    registry.register(
        ResourceDescriptor::new(
            ResourceKind::Lifecycles,
            "Lifecycles-1",
            "${octopusdeploy_lifecycle.release.id}",
        )
        .with_render(|rctx| rctx.resolve(ResourceKind::Environments, "Environments-1")),
    );
    registry.register(environment("Environments-1", "production"));

    let frozen = registry.freeze();
    let writer = HclWriter::new();
    let rctx = RenderContext::new(&frozen, &writer, true);

    let lifecycle = frozen
        .get(ResourceKind::Lifecycles, "Lifecycles-1")
        .unwrap();
    assert_eq!(
        lifecycle.render(&rctx).unwrap(),
        "${octopusdeploy_environment.production.id}"
    );
    assert!(frozen.unresolved_references().is_empty());
}

#[test]
fn test_skipped_ids_drop_out_of_lists() {
    let registry = ResourceRegistry::new();
    registry.register(environment("Environments-1", "development"));
    registry
        .claim(ResourceKind::Environments, "Environments-2")
        .unwrap()
        .skip();

    let frozen = registry.freeze();
    let writer = HclWriter::new();
    let rctx = RenderContext::new(&frozen, &writer, false);

    let resolved = rctx
        .resolve_many(
            ResourceKind::Environments,
            &["Environments-1", "Environments-2", "Environments-3"],
        )
        .unwrap();
    assert_eq!(
        resolved,
        vec![
            "${octopusdeploy_environment.development.id}".to_string(),
            "unresolved:Environments/Environments-3".to_string(),
        ]
    );
    assert_eq!(
        frozen.unresolved_references(),
        vec![(ResourceKind::Environments, "Environments-3".to_string())]
    );
}
