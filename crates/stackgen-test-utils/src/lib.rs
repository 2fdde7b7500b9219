//! Testing utilities for the stackgen workspace
//!
//! Shared fixtures and template assertions.

#![allow(missing_docs)]

use serde_json::Value;
use stackgen_cfn::{Resource, Template};
use stackgen_core::{EcsStack, EcsStackParams, Environment, OutputFormat, SynthesizedStack};

pub const TEST_STACK_NAME: &str = "EcsStack";
pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_REGION: &str = "ap-northeast-1";

/// Built-in parameters with a fixed environment
pub fn test_params() -> EcsStackParams {
    EcsStackParams::new().with_env(Environment {
        account: Some(TEST_ACCOUNT.to_string()),
        region: Some(TEST_REGION.to_string()),
    })
}

pub fn build_stack(params: &EcsStackParams) -> EcsStack {
    EcsStack::build(TEST_STACK_NAME, params).unwrap()
}

pub fn build_default_stack() -> EcsStack {
    build_stack(&test_params())
}

pub fn synthesize(stack: &EcsStack) -> SynthesizedStack {
    SynthesizedStack::new(stack, OutputFormat::Json).unwrap()
}

pub fn default_template() -> Template {
    synthesize(&build_default_stack()).template().clone()
}

pub fn count_of_type(template: &Template, resource_type: &str) -> usize {
    template.resources_of_type(resource_type).count()
}

/// The only resource of `resource_type`; panics if there is not exactly one
pub fn single_of_type<'a>(template: &'a Template, resource_type: &'a str) -> (&'a str, &'a Resource) {
    let mut matches = template.resources_of_type(resource_type);
    let found = matches
        .next()
        .unwrap_or_else(|| panic!("no {resource_type} in template"));
    assert!(matches.next().is_none(), "more than one {resource_type} in template");
    found
}

pub fn properties<'a>(template: &'a Template, logical_id: &str) -> &'a Value {
    template
        .resource(logical_id)
        .unwrap_or_else(|| panic!("no resource {logical_id}"))
        .properties()
}

pub fn depends_on(template: &Template, logical_id: &str) -> Vec<String> {
    template
        .resource(logical_id)
        .unwrap_or_else(|| panic!("no resource {logical_id}"))
        .depends_on()
        .iter()
        .cloned()
        .collect()
}

