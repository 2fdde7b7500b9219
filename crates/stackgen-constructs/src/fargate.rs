//! ECS cluster, Fargate task definition and service
//!
//! The task runs an nginx proxy next to a busybox sidecar. Shape and sizing
//! are fixed; only placement and the Service Connect name vary.

use stackgen_cfn::types::ec2::{SecurityGroup, SecurityGroupRule};
use stackgen_cfn::types::ecs::{
    AwsvpcConfiguration, Cluster, ContainerDefinition, DeploymentCircuitBreaker,
    DeploymentConfiguration, HealthCheck, NetworkConfiguration, PortMapping, RuntimePlatform,
    Service, ServiceConnectClientAlias, ServiceConnectConfiguration, ServiceConnectService,
    TaskDefinition,
};
use stackgen_cfn::types::iam::{Policy, PolicyDocument, Role, Statement};
use stackgen_cfn::{Duration, Expr};
use stackgen_graph::NodeId;

use crate::error::Result;
use crate::namespace::PrivateDnsNamespace;
use crate::network::{NetworkConstruct, SubnetType};
use crate::stack::{ResourceRef, Stack};

pub const TASK_CPU: u32 = 256;
pub const TASK_MEMORY_MIB: u32 = 512;
pub const CPU_ARCHITECTURE: &str = "ARM64";
pub const OPERATING_SYSTEM_FAMILY: &str = "LINUX";

pub const NGINX_CONTAINER: &str = "NginxContainer";
pub const NGINX_IMAGE: &str = "public.ecr.aws/nginx/nginx:1.26-arm64v8";
pub const NGINX_MEMORY_MIB: u32 = 256;
pub const CONTAINER_PORT: u16 = 80;
pub const PORT_MAPPING_NAME: &str = "nginx";

pub const BUSYBOX_CONTAINER: &str = "BusyboxContainer";
pub const BUSYBOX_IMAGE: &str = "public.ecr.aws/docker/library/busybox:stable-glibc";
pub const BUSYBOX_MEMORY_MIB: u32 = 128;

pub const HEALTH_CHECK_COMMAND: [&str; 2] = ["CMD-SHELL", "curl -f http://localhost || exit 1"];
pub const HEALTH_CHECK_RETRIES: u32 = 2;
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::seconds(30);
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::seconds(15);
pub const HEALTH_CHECK_START_PERIOD: Duration = Duration::seconds(5);

pub const DESIRED_COUNT: u32 = 2;
pub const MAXIMUM_PERCENT: u32 = 200;
pub const MINIMUM_HEALTHY_PERCENT: u32 = 50;

/// Actions the task role needs for ECS Exec
pub const EXEC_COMMAND_ACTIONS: [&str; 4] = [
    "ssmmessages:CreateControlChannel",
    "ssmmessages:CreateDataChannel",
    "ssmmessages:OpenControlChannel",
    "ssmmessages:OpenDataChannel",
];

const TASK_SERVICE_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";

/// Inputs of [`EcsFargateConstruct::new`]
#[derive(Debug, Clone, Copy)]
pub struct EcsFargateProps<'a> {
    pub network: &'a NetworkConstruct,
    pub namespace: &'a PrivateDnsNamespace,
    /// Service Connect discovery name and client alias
    pub discovery_name: &'a str,
}

/// One Fargate service with its cluster and task definition
#[derive(Debug, Clone)]
pub struct EcsFargateConstruct {
    node: NodeId,
    cluster: ResourceRef,
    task_role: ResourceRef,
    task_role_policy: ResourceRef,
    task_definition: ResourceRef,
    security_group: ResourceRef,
    service: ResourceRef,
    discovery_name: String,
}

impl EcsFargateConstruct {
    /// # Errors
    /// Graph and template errors from [`Stack`]
    pub fn new(stack: &mut Stack, scope: NodeId, id: &str, props: &EcsFargateProps<'_>) -> Result<Self> {
        let node = stack.add_scope(scope, id)?;

        let cluster_scope = stack.add_scope(node, "Cluster")?;
        let cluster = stack.add_resource(cluster_scope, "Resource", &Cluster::with_container_insights(true))?;

        let task_scope = stack.add_scope(node, "TaskDefinition")?;
        let role_scope = stack.add_scope(task_scope, "TaskRole")?;
        let task_role = stack.add_resource(role_scope, "Resource", &Role::for_service(TASK_SERVICE_PRINCIPAL))?;

        let policy_scope = stack.add_scope(role_scope, "DefaultPolicy")?;
        let policy_name = stack.logical_id_for(policy_scope, "Resource")?;
        let task_role_policy = stack.add_resource(
            policy_scope,
            "Resource",
            &Policy {
                policy_document: PolicyDocument::new(vec![
                    Statement::allow(EXEC_COMMAND_ACTIONS).resources(vec![Expr::from("*")])
                ]),
                policy_name,
                roles: vec![task_role.to_ref()],
            },
        )?;

        let family = format!(
            "{}{}",
            alphanumeric(stack.name()),
            stack.logical_id_for(task_scope, "Resource")?
        );
        let task_definition = stack.add_resource(
            task_scope,
            "Resource",
            &TaskDefinition {
                container_definitions: vec![nginx_container()?, busybox_container()],
                cpu: TASK_CPU.to_string(),
                family,
                memory: TASK_MEMORY_MIB.to_string(),
                network_mode: "awsvpc".to_string(),
                requires_compatibilities: vec!["FARGATE".to_string()],
                runtime_platform: RuntimePlatform {
                    cpu_architecture: CPU_ARCHITECTURE.to_string(),
                    operating_system_family: OPERATING_SYSTEM_FAMILY.to_string(),
                },
                task_role_arn: Some(task_role.get_att("Arn")),
            },
        )?;

        let service_scope = stack.add_scope(node, "Service")?;
        let sg_scope = stack.add_scope(service_scope, "SecurityGroup")?;
        let security_group = stack.add_resource(
            sg_scope,
            "Resource",
            &SecurityGroup {
                group_description: stack.path(sg_scope)?.to_string(),
                security_group_egress: vec![SecurityGroupRule::allow_all_outbound()],
                security_group_ingress: vec![SecurityGroupRule::tcp(
                    props.network.vpc_cidr_block(),
                    CONTAINER_PORT,
                    format!("from VPC CIDR:{CONTAINER_PORT}"),
                )],
                vpc_id: props.network.vpc().to_ref(),
            },
        )?;

        let subnets = props
            .network
            .subnets_of_type(SubnetType::Public)
            .map(|s| s.subnet.to_ref())
            .collect();
        let service = stack.add_resource(
            service_scope,
            "Service",
            &Service {
                cluster: cluster.to_ref(),
                deployment_configuration: DeploymentConfiguration {
                    deployment_circuit_breaker: Some(DeploymentCircuitBreaker {
                        enable: true,
                        rollback: true,
                    }),
                    maximum_percent: MAXIMUM_PERCENT,
                    minimum_healthy_percent: MINIMUM_HEALTHY_PERCENT,
                },
                desired_count: DESIRED_COUNT,
                enable_ecs_managed_tags: false,
                enable_execute_command: true,
                launch_type: "FARGATE".to_string(),
                network_configuration: NetworkConfiguration {
                    awsvpc_configuration: AwsvpcConfiguration {
                        assign_public_ip: "ENABLED".to_string(),
                        security_groups: vec![security_group.get_att("GroupId")],
                        subnets,
                    },
                },
                service_connect_configuration: Some(ServiceConnectConfiguration {
                    enabled: true,
                    namespace: props.namespace.namespace_name().to_string(),
                    services: vec![ServiceConnectService {
                        client_aliases: vec![ServiceConnectClientAlias {
                            dns_name: props.discovery_name.to_string(),
                            port: CONTAINER_PORT,
                        }],
                        discovery_name: props.discovery_name.to_string(),
                        port_name: PORT_MAPPING_NAME.to_string(),
                    }],
                }),
                task_definition: task_definition.to_ref(),
            },
        )?;
        // exec needs the role's permissions in place before tasks start
        stack.add_dependency(service.node(), task_role_policy.node())?;

        tracing::debug!(
            service = service.logical_id(),
            discovery_name = props.discovery_name,
            "fargate service declared"
        );

        Ok(Self {
            node,
            cluster,
            task_role,
            task_role_policy,
            task_definition,
            security_group,
            service,
            discovery_name: props.discovery_name.to_string(),
        })
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[inline]
    #[must_use]
    pub fn cluster(&self) -> &ResourceRef {
        &self.cluster
    }

    #[inline]
    #[must_use]
    pub fn task_role(&self) -> &ResourceRef {
        &self.task_role
    }

    #[inline]
    #[must_use]
    pub fn task_role_policy(&self) -> &ResourceRef {
        &self.task_role_policy
    }

    #[inline]
    #[must_use]
    pub fn task_definition(&self) -> &ResourceRef {
        &self.task_definition
    }

    #[inline]
    #[must_use]
    pub fn security_group(&self) -> &ResourceRef {
        &self.security_group
    }

    #[inline]
    #[must_use]
    pub fn service(&self) -> &ResourceRef {
        &self.service
    }

    #[inline]
    #[must_use]
    pub fn discovery_name(&self) -> &str {
        &self.discovery_name
    }
}

fn nginx_container() -> Result<ContainerDefinition> {
    Ok(ContainerDefinition {
        essential: true,
        health_check: Some(HealthCheck {
            command: HEALTH_CHECK_COMMAND.iter().map(ToString::to_string).collect(),
            interval: HEALTH_CHECK_INTERVAL.to_seconds()?,
            retries: HEALTH_CHECK_RETRIES,
            start_period: HEALTH_CHECK_START_PERIOD.to_seconds()?,
            timeout: HEALTH_CHECK_TIMEOUT.to_seconds()?,
        }),
        image: NGINX_IMAGE.to_string(),
        memory: NGINX_MEMORY_MIB,
        name: NGINX_CONTAINER.to_string(),
        port_mappings: vec![PortMapping {
            app_protocol: Some("http".to_string()),
            container_port: CONTAINER_PORT,
            name: Some(PORT_MAPPING_NAME.to_string()),
            protocol: "tcp".to_string(),
        }],
        pseudo_terminal: false,
    })
}

fn busybox_container() -> ContainerDefinition {
    ContainerDefinition {
        essential: true,
        health_check: None,
        image: BUSYBOX_IMAGE.to_string(),
        memory: BUSYBOX_MEMORY_MIB,
        name: BUSYBOX_CONTAINER.to_string(),
        port_mappings: Vec::new(),
        pseudo_terminal: true,
    }
}

fn alphanumeric(s: &str) -> String {
    s.chars().filter(char::is_ascii_alphanumeric).collect()
}
