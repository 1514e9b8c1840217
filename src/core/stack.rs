//! CloudFormation invocations through the AWS CLI.
//!
//! Credentials come from the CLI's own chain (environment, shared config,
//! instance role). Region and profile are forwarded when configured.

use serde_json::Value;

use crate::defaults::DeploySettings;
use crate::executor::Invocation;

fn aws(settings: &DeploySettings) -> Invocation {
    let mut inv = Invocation::new("aws");
    if let Some(region) = &settings.region {
        inv = inv.arg("--region").arg(region);
    }
    if let Some(profile) = &settings.profile {
        inv = inv.arg("--profile").arg(profile);
    }
    inv.arg("cloudformation")
}

/// Upload local assets referenced by the template and write the rewritten
/// template.
pub fn package(settings: &DeploySettings, artifact_bucket: &str) -> Invocation {
    aws(settings)
        .arg("package")
        .arg("--template-file")
        .arg(settings.template.display().to_string())
        .arg("--s3-bucket")
        .arg(artifact_bucket)
        .arg("--output-template-file")
        .arg(settings.packaged_template.display().to_string())
}

/// Create or update the stack from the packaged template. The secret, when
/// present, is the only parameter override.
pub fn deploy(settings: &DeploySettings, stack_name: &str, secret: Option<&str>) -> Invocation {
    let mut inv = aws(settings)
        .arg("deploy")
        .arg("--template-file")
        .arg(settings.packaged_template.display().to_string())
        .arg("--stack-name")
        .arg(stack_name);

    if !settings.capabilities.is_empty() {
        inv = inv
            .arg("--capabilities")
            .args(settings.capabilities.iter().cloned());
    }

    inv = inv.arg("--no-fail-on-empty-changeset");

    if let Some(secret) = secret {
        inv = inv
            .arg("--parameter-overrides")
            .secret_arg(format!("{}={}", settings.secret_parameter, secret));
    }

    inv
}

/// JMESPath selecting one named output value.
pub fn output_query(output_key: &str) -> String {
    format!(
        "Stacks[0].Outputs[?OutputKey=='{}'].OutputValue",
        output_key
    )
}

/// Query the single configured output of the stack as JSON.
pub fn describe_output(settings: &DeploySettings, stack_name: &str) -> Invocation {
    aws(settings)
        .arg("describe-stacks")
        .arg("--stack-name")
        .arg(stack_name)
        .arg("--query")
        .arg(output_query(&settings.output_key))
        .arg("--output")
        .arg("json")
}

/// Extract the output value from the query result.
///
/// The CLI prints a JSON list (`["https://..."]`), or `[]`/`null` when the
/// stack has no such output.
pub fn parse_output_value(stdout: &str) -> Option<String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return None;
    }

    let value = match serde_json::from_str::<Value>(trimmed).ok()? {
        Value::Array(items) => items
            .into_iter()
            .find_map(|item| item.as_str().map(str::to_string)),
        Value::String(s) => Some(s),
        _ => None,
    };

    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_passes_bucket_and_templates() {
        let inv = package(&DeploySettings::default(), "my-artifacts");
        assert_eq!(
            inv.display(),
            "aws cloudformation package --template-file template.yaml --s3-bucket my-artifacts --output-template-file packaged.yaml"
        );
    }

    #[test]
    fn deploy_without_secret_has_no_overrides() {
        let inv = deploy(&DeploySettings::default(), "bot-stack", None);
        assert!(!inv.has_arg("--parameter-overrides"));
        assert!(inv.secret_args.is_empty());
        assert!(inv.has_arg("CAPABILITY_IAM"));
        assert!(inv.has_arg("--no-fail-on-empty-changeset"));
    }

    #[test]
    fn deploy_with_secret_overrides_named_parameter() {
        let inv = deploy(&DeploySettings::default(), "bot-stack", Some("xoxb-1"));
        assert_eq!(inv.args.last().map(String::as_str), Some("SlackToken=xoxb-1"));
        assert!(inv.display().ends_with("--parameter-overrides SlackToken=****"));
    }

    #[test]
    fn region_and_profile_precede_service() {
        let settings = DeploySettings {
            region: Some("eu-west-1".to_string()),
            profile: Some("ops".to_string()),
            ..DeploySettings::default()
        };
        let inv = describe_output(&settings, "bot-stack");
        assert_eq!(
            &inv.args[..5],
            &["--region", "eu-west-1", "--profile", "ops", "cloudformation"]
        );
    }

    #[test]
    fn describe_queries_one_output() {
        let inv = describe_output(&DeploySettings::default(), "bot-stack");
        let query_pos = inv.args.iter().position(|a| a == "--query").unwrap();
        assert_eq!(
            inv.args[query_pos + 1],
            "Stacks[0].Outputs[?OutputKey=='WebhookUrl'].OutputValue"
        );
        assert_eq!(inv.args.iter().filter(|a| *a == "--query").count(), 1);
    }

    #[test]
    fn parse_output_value_reads_first_string() {
        assert_eq!(
            parse_output_value("[\n    \"https://abc.execute-api.us-east-1.amazonaws.com/Prod/\"\n]\n"),
            Some("https://abc.execute-api.us-east-1.amazonaws.com/Prod/".to_string())
        );
    }

    #[test]
    fn parse_output_value_handles_absent_output() {
        assert_eq!(parse_output_value("[]"), None);
        assert_eq!(parse_output_value("null"), None);
        assert_eq!(parse_output_value("  \n"), None);
        assert_eq!(parse_output_value("not json"), None);
    }
}
