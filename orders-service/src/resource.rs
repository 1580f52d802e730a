use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEPLOYMENT_ENVIRONMENT: &str = "development";
const SERVICE_NAMESPACE: &str = "ecommerce";

/// Resource describing this deployment, shared by traces and metrics.
///
/// On top of the SDK's detectors (which also pick up `OTEL_RESOURCE_ATTRIBUTES`,
/// e.g. `deployment.region=us-east-1,team.name=platform-team`) it sets the
/// version, environment, namespace and instance id from the environment.
pub fn service_resource(service_name: &str) -> Resource {
    service_resource_from(service_name, |key| std::env::var(key).ok())
}

pub fn service_resource_from<F>(service_name: &str, lookup: F) -> Resource
where
    F: Fn(&str) -> Option<String>,
{
    let attribute = |key: &'static str, env: &str, default: String| {
        KeyValue::new(key, lookup(env).unwrap_or(default))
    };

    Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attributes([
            attribute("service.version", "SERVICE_VERSION", SERVICE_VERSION.to_string()),
            attribute(
                "deployment.environment",
                "DEPLOYMENT_ENVIRONMENT",
                DEPLOYMENT_ENVIRONMENT.to_string(),
            ),
            attribute("service.namespace", "SERVICE_NAMESPACE", SERVICE_NAMESPACE.to_string()),
            attribute(
                "service.instance.id",
                "SERVICE_INSTANCE_ID",
                format!("{service_name}-001"),
            ),
        ])
        .build()
}

/// Resource attributes as Prometheus label pairs (`service.name` becomes
/// `service_name`), sorted by label name.
pub fn resource_labels(resource: &Resource) -> Vec<(String, String)> {
    let mut labels: Vec<(String, String)> = resource
        .iter()
        .map(|(key, value)| (key.as_str().replace('.', "_"), value.as_str().into_owned()))
        .collect();
    labels.sort();
    labels
}
