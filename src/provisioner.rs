//! Schema provisioning through CloudFormation stacks.
//!
//! A stack is submitted once and polled until it settles. Nothing is retried: a stack
//! name that is already taken, a rejected template or a rolled back stack all surface as
//! [`error::ProvisioningError`].

use crate::{config, error};

use aws_sdk_cloudformation::{Client, error::ProvideErrorMetadata, types};
use indexmap::IndexMap;
use std::{fs, path};

/// A named stack and the template it is created from.
#[derive(Clone, Debug, PartialEq)]
pub struct StackDescriptor {
    /// Stack name, unique among live stacks.
    pub stack_name: String,
    /// Template body, submitted verbatim.
    pub template_body: String,
    /// Values for the template's parameters; unset parameters keep their defaults.
    pub parameters: IndexMap<String, String>,
}

impl StackDescriptor {
    /// Describe a stack from an in-memory template.
    pub fn new(stack_name: impl Into<String>, template_body: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template_body: template_body.into(),
            parameters: IndexMap::new(),
        }
    }

    /// Set the template parameter `key`.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    fn stack_parameters(&self) -> Option<Vec<types::Parameter>> {
        if self.parameters.is_empty() {
            return None;
        }
        let parameters = self
            .parameters
            .iter()
            .map(|(key, value)| {
                types::Parameter::builder()
                    .parameter_key(key)
                    .parameter_value(value)
                    .build()
            })
            .collect();
        Some(parameters)
    }

    /// Describe a stack from a template file, read verbatim.
    pub fn from_file(
        stack_name: impl Into<String>,
        template_path: impl AsRef<path::Path>,
    ) -> error::Result<Self> {
        let template_body = fs::read_to_string(template_path)?;
        Ok(Self::new(stack_name, template_body))
    }
}

/// Where a stack is in its lifecycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StackPhase {
    /// Still being created, updated or deleted.
    Pending,
    /// Created, updated or imported successfully.
    Complete,
    /// Failed or rolled back.
    Failed,
    /// Deleted.
    Deleted,
}

impl From<&types::StackStatus> for StackPhase {
    fn from(status: &types::StackStatus) -> Self {
        let status = status.as_str();
        if status == "DELETE_COMPLETE" {
            Self::Deleted
        } else if status.contains("ROLLBACK") || status.ends_with("_FAILED") {
            Self::Failed
        } else if status.ends_with("_COMPLETE") {
            Self::Complete
        } else {
            Self::Pending
        }
    }
}

/// The observed state of a stack.
#[derive(Clone, Debug, PartialEq)]
pub struct StackSummary {
    /// Stack name.
    pub stack_name: String,
    /// Stack id, when the service reported one.
    pub stack_id: Option<String>,
    /// Raw status, e.g. `CREATE_COMPLETE`.
    pub status: String,
    /// Classified status.
    pub phase: StackPhase,
    /// Why the stack is in this status, when the service said so.
    pub reason: Option<String>,
}

impl StackSummary {
    fn new(
        stack_name: Option<String>,
        stack_id: Option<String>,
        status: Option<types::StackStatus>,
        reason: Option<String>,
    ) -> Self {
        let (status, phase) = match status {
            Some(status) => (status.as_str().to_string(), StackPhase::from(&status)),
            None => (String::new(), StackPhase::Pending),
        };
        Self {
            stack_name: stack_name.unwrap_or_default(),
            stack_id,
            status,
            phase,
            reason,
        }
    }
}

impl From<types::Stack> for StackSummary {
    fn from(stack: types::Stack) -> Self {
        Self::new(
            stack.stack_name,
            stack.stack_id,
            stack.stack_status,
            stack.stack_status_reason,
        )
    }
}

impl From<types::StackSummary> for StackSummary {
    fn from(stack: types::StackSummary) -> Self {
        Self::new(
            stack.stack_name,
            stack.stack_id,
            stack.stack_status,
            stack.stack_status_reason,
        )
    }
}

/// Describing a stack by name that does not exist fails with a validation error.
fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some("ValidationError")
        && message.is_some_and(|message| message.contains("does not exist"))
}

/// Creates, inspects and deletes stacks.
///
/// ```rust,no_run
/// use dynamodb_harness::{client::ClientFactory, config::WaitPolicy, provisioner::StackDescriptor};
///
/// # async fn example(factory: ClientFactory) -> dynamodb_harness::error::Result<()> {
/// let descriptor = StackDescriptor::from_file("created-by-test", "templates/customer_table.yaml")?;
/// let summary = factory.provisioner(WaitPolicy::default()).apply(&descriptor).await?;
/// assert_eq!(summary.status, "CREATE_COMPLETE");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SchemaProvisioner {
    client: Client,
    wait: config::WaitPolicy,
}

impl SchemaProvisioner {
    /// Wrap `client`; every wait is bounded by `wait`.
    pub fn new(client: Client, wait: config::WaitPolicy) -> Self {
        Self { client, wait }
    }

    /// Create the stack and wait until it is complete.
    ///
    /// Fails with [`error::ProvisioningError::StackExists`] when a live stack already has
    /// this name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_harness.apply_stack",
            skip(self, descriptor),
            fields(stack = %descriptor.stack_name),
            err
        )
    )]
    pub async fn apply(&self, descriptor: &StackDescriptor) -> error::Result<StackSummary> {
        let stack_name = &descriptor.stack_name;
        if let Some(existing) = self.describe(stack_name).await? {
            if existing.phase != StackPhase::Deleted {
                return Err(error::ProvisioningError::StackExists {
                    stack_name: stack_name.clone(),
                    status: existing.status,
                }
                .into());
            }
        }
        let created = self
            .client
            .create_stack()
            .stack_name(stack_name)
            .template_body(&descriptor.template_body)
            .set_parameters(descriptor.stack_parameters())
            .send()
            .await;
        if let Err(error) = created {
            let already_exists = error
                .as_service_error()
                .is_some_and(|error| error.is_already_exists_exception());
            let provisioning = if already_exists {
                let status = self
                    .describe(stack_name)
                    .await?
                    .map(|existing| existing.status)
                    .unwrap_or_default();
                error::ProvisioningError::StackExists {
                    stack_name: stack_name.clone(),
                    status,
                }
            } else {
                error::ProvisioningError::Rejected {
                    stack_name: stack_name.clone(),
                    message: aws_sdk_cloudformation::error::DisplayErrorContext(&error)
                        .to_string(),
                }
            };
            return Err(provisioning.into());
        }
        let summary = self
            .wait
            .poll(stack_name, move || async move {
                let Some(summary) = self.describe(stack_name).await? else {
                    return Ok(None);
                };
                match summary.phase {
                    StackPhase::Complete => Ok(Some(summary)),
                    StackPhase::Pending => Ok(None),
                    StackPhase::Failed | StackPhase::Deleted => {
                        Err(error::ProvisioningError::Failed {
                            stack_name: stack_name.clone(),
                            status: summary.status,
                            reason: summary.reason.unwrap_or_default(),
                        }
                        .into())
                    }
                }
            })
            .await?;
        #[cfg(feature = "tracing")]
        tracing::info!(status = %summary.status, "stack created");
        Ok(summary)
    }

    /// Delete the stack and wait until it is gone. Deleting a missing stack succeeds.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_harness.delete_stack", skip(self), err)
    )]
    pub async fn delete(&self, stack_name: &str) -> error::Result<()> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|error| error::Error::transport("DeleteStack", error))?;
        self.wait
            .poll(stack_name, move || async move {
                let Some(summary) = self.describe(stack_name).await? else {
                    return Ok(Some(()));
                };
                match summary.phase {
                    StackPhase::Deleted => Ok(Some(())),
                    StackPhase::Failed => Err(error::ProvisioningError::Failed {
                        stack_name: stack_name.to_string(),
                        status: summary.status,
                        reason: summary.reason.unwrap_or_default(),
                    }
                    .into()),
                    StackPhase::Pending | StackPhase::Complete => Ok(None),
                }
            })
            .await
    }

    /// The current state of the stack, or `None` when there is no such stack.
    pub async fn describe(&self, stack_name: &str) -> error::Result<Option<StackSummary>> {
        let output = match self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(output) => output,
            Err(error) if is_missing_stack(error.code(), error.message()) => return Ok(None),
            Err(error) => return Err(error::Error::transport("DescribeStacks", error)),
        };
        Ok(output
            .stacks
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(StackSummary::from))
    }

    /// Every stack the service still reports, deleted ones included.
    pub async fn list(&self) -> error::Result<Vec<StackSummary>> {
        let mut summaries = Vec::new();
        let mut pages = self.client.list_stacks().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|error| error::Error::transport("ListStacks", error))?;
            summaries.extend(
                page.stack_summaries
                    .unwrap_or_default()
                    .into_iter()
                    .map(StackSummary::from),
            );
        }
        Ok(summaries)
    }

    /// Ask the service to validate the template without creating anything.
    pub async fn validate(&self, descriptor: &StackDescriptor) -> error::Result<()> {
        self.client
            .validate_template()
            .template_body(&descriptor.template_body)
            .send()
            .await
            .map_err(|error| error::ProvisioningError::Rejected {
                stack_name: descriptor.stack_name.clone(),
                message: aws_sdk_cloudformation::error::DisplayErrorContext(&error).to_string(),
            })?;
        Ok(())
    }
}
