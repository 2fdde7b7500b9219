//! Encrypted, private, TLS-only S3 bucket for logs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackgen_cfn::types::iam::{PolicyDocument, Principal, Statement};
use stackgen_cfn::types::s3::{
    AbortIncompleteMultipartUpload, Bucket, BucketEncryption, BucketPolicy,
    LifecycleConfiguration, LifecycleRule as CfnLifecycleRule, PublicAccessBlockConfiguration,
};
use stackgen_cfn::{CfnError, DeletionPolicy, Duration, Expr};
use stackgen_graph::NodeId;

use crate::error::{ConstructError, Result};
use crate::stack::{ResourceRef, Stack};

/// Time-based expiration of objects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LifecycleRule {
    pub expiration_days: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_incomplete_multipart_upload_after: Option<Duration>,
}

impl LifecycleRule {
    #[must_use]
    pub fn expire_after_days(days: u64) -> Self {
        Self {
            expiration_days: days,
            prefix: None,
            rule_name_suffix: None,
            abort_incomplete_multipart_upload_after: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.rule_name_suffix = Some(suffix.into());
        self
    }

    #[must_use]
    pub fn abort_multipart_after(mut self, after: Duration) -> Self {
        self.abort_incomplete_multipart_upload_after = Some(after);
        self
    }

    fn to_cfn(&self) -> Result<CfnLifecycleRule> {
        let id = rule_id(self);
        let invalid = |reason: &str| ConstructError::InvalidLifecycleRule {
            rule: id.clone(),
            reason: reason.to_string(),
        };

        if self.expiration_days == 0 {
            return Err(invalid("expiration must be at least one day"));
        }
        let abort = match self.abort_incomplete_multipart_upload_after {
            None => None,
            Some(after) => {
                let days = after.to_days().map_err(|e| match e {
                    CfnError::DurationOverflow(_) => invalid("multipart abort window is too long"),
                    _ => invalid("multipart abort must be a whole number of days"),
                })?;
                if days == 0 {
                    return Err(invalid("multipart abort must be at least one day"));
                }
                Some(AbortIncompleteMultipartUpload {
                    days_after_initiation: days,
                })
            }
        };

        Ok(CfnLifecycleRule {
            abort_incomplete_multipart_upload: abort,
            expiration_in_days: Some(self.expiration_days),
            expired_object_delete_marker: false,
            id,
            prefix: self.prefix.clone(),
            status: "Enabled".to_string(),
        })
    }
}

/// `Delete-After-{days}Days`, with `-{suffix}` appended when a suffix is set
#[must_use]
pub fn rule_id(rule: &LifecycleRule) -> String {
    match &rule.rule_name_suffix {
        Some(suffix) => format!("Delete-After-{}Days-{suffix}", rule.expiration_days),
        None => format!("Delete-After-{}Days", rule.expiration_days),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogBucketProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
    pub lifecycle_rules: Vec<LifecycleRule>,
}

/// A log bucket and its resource policy
#[derive(Debug, Clone)]
pub struct LogBucketConstruct {
    node: NodeId,
    bucket: ResourceRef,
    policy: ResourceRef,
    statements: Vec<Statement>,
}

impl LogBucketConstruct {
    /// Declare the bucket under `scope/id`
    ///
    /// # Errors
    /// - [`ConstructError::InvalidLifecycleRule`] for zero or fractional days
    /// - [`ConstructError::DuplicateLifecycleRuleId`] if two rules share an id
    /// - graph and template errors from [`Stack`]
    pub fn new(stack: &mut Stack, scope: NodeId, id: &str, props: &LogBucketProps) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut rules = Vec::with_capacity(props.lifecycle_rules.len());
        for rule in &props.lifecycle_rules {
            let rule = rule.to_cfn()?;
            if !seen.insert(rule.id.clone()) {
                return Err(ConstructError::DuplicateLifecycleRuleId(rule.id));
            }
            rules.push(rule);
        }

        let node = stack.add_scope(scope, id)?;
        let default = stack.add_scope(node, "Default")?;
        let bucket = stack.add_resource(
            default,
            "Resource",
            &Bucket {
                bucket_name: props.bucket_name.clone(),
                bucket_encryption: BucketEncryption::s3_managed(),
                lifecycle_configuration: (!rules.is_empty())
                    .then(|| LifecycleConfiguration { rules }),
                public_access_block_configuration: PublicAccessBlockConfiguration::block_all(),
                versioning_configuration: None,
                tags: Vec::new(),
            },
        )?;
        stack.set_deletion_policy(bucket.node(), DeletionPolicy::Retain)?;

        let statements = vec![Statement::deny(["s3:*"])
            .principal(Principal::Aws(Expr::from("*")))
            .resources(object_and_bucket_arns(&bucket))
            .condition(json!({ "Bool": { "aws:SecureTransport": "false" } }))];

        let policy_scope = stack.add_scope(default, "Policy")?;
        let policy = stack.add_resource(
            policy_scope,
            "Resource",
            &BucketPolicy {
                bucket: bucket.to_ref(),
                policy_document: PolicyDocument::new(statements.clone()),
            },
        )?;

        tracing::debug!(bucket = bucket.logical_id(), "log bucket declared");
        Ok(Self {
            node,
            bucket,
            policy,
            statements,
        })
    }

    /// Append a statement to the bucket policy
    ///
    /// # Errors
    /// Template errors from [`Stack::update_resource`]
    pub fn add_to_resource_policy(&mut self, stack: &mut Stack, statement: Statement) -> Result<()> {
        self.statements.push(statement);
        stack.update_resource(
            self.policy.node(),
            &BucketPolicy {
                bucket: self.bucket.to_ref(),
                policy_document: PolicyDocument::new(self.statements.clone()),
            },
        )
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn bucket(&self) -> &ResourceRef {
        &self.bucket
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> &ResourceRef {
        &self.policy
    }

    #[inline]
    #[must_use]
    pub fn arn(&self) -> Expr {
        self.bucket.get_att("Arn")
    }

    #[inline]
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

fn object_and_bucket_arns(bucket: &ResourceRef) -> Vec<Expr> {
    vec![
        bucket.get_att("Arn"),
        Expr::join("", vec![bucket.get_att("Arn"), "/*".into()]),
    ]
}
