//! VPC, subnets, gateways and flow logs

use serde::{Deserialize, Serialize};
use serde_json::json;
use stackgen_cfn::types::ec2::{
    Eip, FlowLog, FlowLogDestinationOptions, InternetGateway, NatGateway, Route, RouteTable,
    Subnet, SubnetRouteTableAssociation, Vpc, VpcEndpoint, VpcGatewayAttachment,
};
use stackgen_cfn::types::iam::{Principal, Statement};
use stackgen_cfn::types::Tag;
use stackgen_cfn::{Duration, Expr};
use stackgen_graph::{GraphError, NodeId};

use crate::cidr::{CidrAllocator, Ipv4Cidr, MAX_PREFIX, MIN_PREFIX};
use crate::error::{ConstructError, Result};
use crate::log_bucket::{LifecycleRule, LogBucketConstruct, LogBucketProps};
use crate::log_format::{render_log_format, LogField};
use crate::stack::{ResourceRef, Stack};

/// Flow logs are aggregated over this window before delivery
pub const FLOW_LOG_AGGREGATION_INTERVAL: Duration = Duration::minutes(10);

const LOG_DELIVERY_SERVICE: &str = "delivery.logs.amazonaws.com";
const FLOW_LOGS_BUCKET_ID: &str = "FlowLogsBucket";
const FLOW_LOG_SCOPE_ID: &str = "FlowLogsToS3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    /// Routed to the internet gateway, instances get public IPs
    Public,
    /// Outbound through NAT gateways
    PrivateWithEgress,
    /// No route out of the VPC
    PrivateIsolated,
}

impl SubnetType {
    /// Value of the `aws-cdk:subnet-type` tag
    #[must_use]
    pub const fn tag_value(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::PrivateWithEgress => "Private",
            Self::PrivateIsolated => "Isolated",
        }
    }
}

/// One subnet group, instantiated once per availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubnetConfiguration {
    pub name: String,
    pub subnet_type: SubnetType,
    pub cidr_mask: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowLogTrafficType {
    #[default]
    All,
    Accept,
    Reject,
}

impl FlowLogTrafficType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Accept => "ACCEPT",
            Self::Reject => "REJECT",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowLogFileFormat {
    #[default]
    PlainText,
    Parquet,
}

impl FlowLogFileFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain-text",
            Self::Parquet => "parquet",
        }
    }
}

/// How flow log objects are laid out in S3
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct S3DestinationOptions {
    pub file_format: FlowLogFileFormat,
    pub hive_compatible_partitions: bool,
    pub per_hour_partition: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowLogProps {
    pub traffic_type: FlowLogTrafficType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<S3DestinationOptions>,
    pub lifecycle_rules: Vec<LifecycleRule>,
}

/// Missing fields fall back to [`NetworkProps::default`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkProps {
    pub vpc_cidr: String,
    pub subnet_configurations: Vec<SubnetConfiguration>,
    pub max_azs: u32,
    /// Explicit zone names; overrides `max_azs` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zones: Option<Vec<String>>,
    pub nat_gateways: u32,
    pub vpc_flow_logs: FlowLogProps,
}

impl Default for NetworkProps {
    fn default() -> Self {
        Self {
            vpc_cidr: "10.10.0.0/20".to_string(),
            subnet_configurations: vec![SubnetConfiguration {
                name: "public".to_string(),
                subnet_type: SubnetType::Public,
                cidr_mask: 27,
            }],
            max_azs: 2,
            availability_zones: None,
            nat_gateways: 0,
            vpc_flow_logs: FlowLogProps {
                traffic_type: FlowLogTrafficType::All,
                options: Some(S3DestinationOptions {
                    file_format: FlowLogFileFormat::PlainText,
                    hive_compatible_partitions: false,
                    per_hour_partition: true,
                }),
                lifecycle_rules: vec![LifecycleRule::expire_after_days(365)
                    .abort_multipart_after(Duration::days(30))],
            },
        }
    }
}

/// A subnet and the resources that route it
#[derive(Debug, Clone)]
pub struct SubnetHandle {
    pub scope: NodeId,
    pub name: String,
    pub subnet_type: SubnetType,
    pub cidr: Ipv4Cidr,
    pub subnet: ResourceRef,
    pub route_table: ResourceRef,
}

/// Resources created by [`NetworkConstruct::add_flow_log`]
#[derive(Debug, Clone)]
pub struct FlowLogHandle {
    pub node: NodeId,
    pub flow_log: ResourceRef,
    pub bucket: LogBucketConstruct,
}

/// The VPC and everything attached to it
#[derive(Debug, Clone)]
pub struct NetworkConstruct {
    node: NodeId,
    vpc_node: NodeId,
    vpc: ResourceRef,
    subnets: Vec<SubnetHandle>,
    internet_gateway: Option<ResourceRef>,
    nat_gateways: Vec<ResourceRef>,
    s3_endpoint: ResourceRef,
    flow_log_props: FlowLogProps,
    flow_log: Option<FlowLogHandle>,
}

impl NetworkConstruct {
    /// Declare the network under `scope/id`
    ///
    /// Subnets take consecutive blocks of the VPC CIDR: configurations in
    /// order, availability zones inner.
    ///
    /// # Errors
    /// - [`ConstructError::InvalidCidr`], [`ConstructError::InvalidMask`] or
    ///   [`ConstructError::CidrExhausted`] for an unworkable address plan
    /// - [`ConstructError::NoAvailabilityZones`] for zero zones
    /// - [`ConstructError::NatWithoutPublicSubnet`] and
    ///   [`ConstructError::InvalidSubnetConfiguration`] for inconsistent subnet plans
    pub fn new(stack: &mut Stack, scope: NodeId, id: &str, props: &NetworkProps) -> Result<Self> {
        let cidr: Ipv4Cidr = props.vpc_cidr.parse()?;
        if !(MIN_PREFIX..=MAX_PREFIX).contains(&cidr.prefix()) {
            return Err(ConstructError::InvalidMask {
                mask: cidr.prefix(),
                reason: format!("VPC block must be between /{MIN_PREFIX} and /{MAX_PREFIX}"),
            });
        }
        let zones = zones(props, cidr)?;
        validate_subnet_plan(props)?;

        let node = stack.add_scope(scope, id)?;
        let vpc_node = stack.add_scope(node, "Default")?;
        let vpc_path = stack.path(vpc_node)?.to_string();
        let vpc = stack.add_resource(
            vpc_node,
            "Resource",
            &Vpc::new(cidr.to_string(), vec![Tag::name(&vpc_path)]),
        )?;

        let has_public = props
            .subnet_configurations
            .iter()
            .any(|c| c.subnet_type == SubnetType::Public);
        let (internet_gateway, attachment) = if has_public {
            let igw = stack.add_resource(
                vpc_node,
                "IGW",
                &InternetGateway {
                    tags: vec![Tag::name(&vpc_path)],
                },
            )?;
            let attachment = stack.add_resource(
                vpc_node,
                "VPCGW",
                &VpcGatewayAttachment {
                    vpc_id: vpc.to_ref(),
                    internet_gateway_id: igw.to_ref(),
                },
            )?;
            (Some(igw), Some(attachment))
        } else {
            (None, None)
        };

        let mut allocator = CidrAllocator::new(cidr);
        let mut subnets = Vec::new();
        for config in &props.subnet_configurations {
            for (index, zone) in zones.iter().enumerate() {
                let block = allocator.allocate(config.cidr_mask)?;
                let scope_id = format!("{}Subnet{}", config.name, index + 1);
                let subnet_scope = stack.add_scope(vpc_node, &scope_id)?;
                let subnet_path = stack.path(subnet_scope)?.to_string();

                let subnet = stack.add_resource(
                    subnet_scope,
                    "Subnet",
                    &Subnet {
                        availability_zone: zone.clone(),
                        cidr_block: block.to_string(),
                        map_public_ip_on_launch: config.subnet_type == SubnetType::Public,
                        vpc_id: vpc.to_ref(),
                        tags: vec![
                            Tag::new("aws-cdk:subnet-name", &config.name),
                            Tag::new("aws-cdk:subnet-type", config.subnet_type.tag_value()),
                            Tag::name(&subnet_path),
                        ],
                    },
                )?;
                let route_table = stack.add_resource(
                    subnet_scope,
                    "RouteTable",
                    &RouteTable {
                        vpc_id: vpc.to_ref(),
                        tags: vec![Tag::name(&subnet_path)],
                    },
                )?;
                stack.add_resource(
                    subnet_scope,
                    "RouteTableAssociation",
                    &SubnetRouteTableAssociation {
                        route_table_id: route_table.to_ref(),
                        subnet_id: subnet.to_ref(),
                    },
                )?;

                if let (SubnetType::Public, Some(igw), Some(attachment)) =
                    (config.subnet_type, &internet_gateway, &attachment)
                {
                    let route = stack.add_resource(
                        subnet_scope,
                        "DefaultRoute",
                        &Route::to_gateway(route_table.to_ref(), igw.to_ref()),
                    )?;
                    stack.add_dependency(route.node(), attachment.node())?;
                }

                subnets.push(SubnetHandle {
                    scope: subnet_scope,
                    name: config.name.clone(),
                    subnet_type: config.subnet_type,
                    cidr: block,
                    subnet,
                    route_table,
                });
            }
        }

        let nat_gateways = add_nat_gateways(stack, props.nat_gateways, &subnets)?;

        let s3_scope = stack.add_scope(vpc_node, "S3")?;
        let s3_endpoint = stack.add_resource(
            s3_scope,
            "Resource",
            &VpcEndpoint::gateway(
                "s3",
                vpc.to_ref(),
                subnets.iter().map(|s| s.route_table.to_ref()).collect(),
            ),
        )?;

        tracing::debug!(
            vpc = vpc.logical_id(),
            cidr = %cidr,
            subnets = subnets.len(),
            nat_gateways = nat_gateways.len(),
            "network declared"
        );

        Ok(Self {
            node,
            vpc_node,
            vpc,
            subnets,
            internet_gateway,
            nat_gateways,
            s3_endpoint,
            flow_log_props: props.vpc_flow_logs.clone(),
            flow_log: None,
        })
    }

    /// Deliver flow logs for the whole VPC to a new `FlowLogsBucket`
    ///
    /// When `dependency` is given the flow log deploys after it.
    ///
    /// # Errors
    /// - [`ConstructError::FlowLogAlreadyAttached`] on a second call
    /// - lifecycle rule and graph errors, raised before anything is declared
    pub fn add_flow_log(&mut self, stack: &mut Stack, dependency: Option<NodeId>) -> Result<&FlowLogHandle> {
        if self.flow_log.is_some() {
            return Err(ConstructError::FlowLogAlreadyAttached(
                stack.path(self.node)?.to_string(),
            ));
        }

        // nothing is declared until every later step is known to succeed
        let max_aggregation_interval = FLOW_LOG_AGGREGATION_INTERVAL.to_seconds()?;
        let network_path = stack.path(self.node)?;
        for id in [FLOW_LOGS_BUCKET_ID, FLOW_LOG_SCOPE_ID] {
            if stack.graph().tree().child(self.node, id).is_some() {
                return Err(GraphError::DuplicateId {
                    parent: network_path.to_string(),
                    id: id.to_string(),
                }
                .into());
            }
        }
        if let Some(dependency) = dependency {
            let scope_path = network_path.child(FLOW_LOG_SCOPE_ID);
            let dependency_path = stack.path(dependency)?;
            if scope_path.overlaps(dependency_path) {
                return Err(GraphError::NestedDependency {
                    dependent: scope_path.to_string(),
                    dependency: dependency_path.to_string(),
                }
                .into());
            }
        }

        let mut bucket = LogBucketConstruct::new(
            stack,
            self.node,
            FLOW_LOGS_BUCKET_ID,
            &LogBucketProps {
                bucket_name: None,
                lifecycle_rules: self.flow_log_props.lifecycle_rules.clone(),
            },
        )?;
        add_log_delivery_statements(stack, &mut bucket)?;

        let node = stack.add_scope(self.node, FLOW_LOG_SCOPE_ID)?;
        let name = stack.path(node)?.to_string();
        let fields = LogField::standard_with_ecs();
        let flow_log = stack.add_resource(
            node,
            "FlowLog",
            &FlowLog {
                resource_id: self.vpc.to_ref(),
                resource_type: "VPC".to_string(),
                traffic_type: self.flow_log_props.traffic_type.as_str().to_string(),
                log_destination_type: "s3".to_string(),
                log_destination: bucket.arn(),
                log_format: Some(render_log_format(&fields)),
                max_aggregation_interval,
                destination_options: self.flow_log_props.options.map(|o| FlowLogDestinationOptions {
                    file_format: o.file_format.as_str().to_string(),
                    hive_compatible_partitions: o.hive_compatible_partitions,
                    per_hour_partition: o.per_hour_partition,
                }),
                tags: vec![Tag::name(name)],
            },
        )?;
        // delivery checks the bucket policy on creation
        stack.add_dependency(flow_log.node(), bucket.policy().node())?;
        if let Some(dependency) = dependency {
            stack.add_dependency(node, dependency)?;
        }

        tracing::debug!(
            flow_log = flow_log.logical_id(),
            bucket = bucket.bucket().logical_id(),
            traffic_type = self.flow_log_props.traffic_type.as_str(),
            "flow log attached"
        );

        Ok(self.flow_log.insert(FlowLogHandle {
            node,
            flow_log,
            bucket,
        }))
    }

    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Scope of the VPC and its subnets
    #[inline]
    #[must_use]
    pub fn vpc_node(&self) -> NodeId {
        self.vpc_node
    }

    #[inline]
    #[must_use]
    pub fn vpc(&self) -> &ResourceRef {
        &self.vpc
    }

    /// `Fn::GetAtt` of the VPC's primary CIDR block
    #[inline]
    #[must_use]
    pub fn vpc_cidr_block(&self) -> Expr {
        self.vpc.get_att("CidrBlock")
    }

    #[inline]
    #[must_use]
    pub fn subnets(&self) -> &[SubnetHandle] {
        &self.subnets
    }

    pub fn subnets_of_type(&self, subnet_type: SubnetType) -> impl Iterator<Item = &SubnetHandle> {
        self.subnets
            .iter()
            .filter(move |s| s.subnet_type == subnet_type)
    }

    #[inline]
    #[must_use]
    pub fn internet_gateway(&self) -> Option<&ResourceRef> {
        self.internet_gateway.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn nat_gateways(&self) -> &[ResourceRef] {
        &self.nat_gateways
    }

    #[inline]
    #[must_use]
    pub fn s3_endpoint(&self) -> &ResourceRef {
        &self.s3_endpoint
    }

    #[inline]
    #[must_use]
    pub fn flow_log(&self) -> Option<&FlowLogHandle> {
        self.flow_log.as_ref()
    }
}

/// Every zone needs at least one `/MAX_PREFIX` block, so the VPC block
/// bounds the zone count before anything is allocated
fn zones(props: &NetworkProps, cidr: Ipv4Cidr) -> Result<Vec<Expr>> {
    let count = match &props.availability_zones {
        Some(names) => names.len() as u64,
        None => u64::from(props.max_azs),
    };
    if count == 0 {
        return Err(ConstructError::NoAvailabilityZones);
    }
    if count > cidr.size() >> (32 - MAX_PREFIX) {
        return Err(ConstructError::CidrExhausted {
            cidr: cidr.to_string(),
            mask: MAX_PREFIX,
        });
    }
    Ok(match &props.availability_zones {
        Some(names) => names.iter().map(|z| Expr::from(z.as_str())).collect(),
        None => (0..props.max_azs as usize).map(Expr::availability_zone).collect(),
    })
}

fn validate_subnet_plan(props: &NetworkProps) -> Result<()> {
    let configs = &props.subnet_configurations;
    if configs.is_empty() {
        return Err(ConstructError::InvalidSubnetConfiguration(
            "at least one subnet configuration is required".to_string(),
        ));
    }
    for (i, config) in configs.iter().enumerate() {
        if config.name.is_empty() || !config.name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConstructError::InvalidSubnetConfiguration(format!(
                "subnet name '{}' must be non-empty and contain only ASCII letters, digits or '-'",
                config.name
            )));
        }
        if configs[..i].iter().any(|c| c.name == config.name) {
            return Err(ConstructError::InvalidSubnetConfiguration(format!(
                "subnet name '{}' used twice",
                config.name
            )));
        }
    }

    let has_public = configs.iter().any(|c| c.subnet_type == SubnetType::Public);
    let has_egress = configs
        .iter()
        .any(|c| c.subnet_type == SubnetType::PrivateWithEgress);
    if props.nat_gateways > 0 && !has_public {
        return Err(ConstructError::NatWithoutPublicSubnet {
            nat_gateways: props.nat_gateways,
        });
    }
    if has_egress && props.nat_gateways == 0 {
        return Err(ConstructError::InvalidSubnetConfiguration(
            "private subnets with egress need at least one NAT gateway".to_string(),
        ));
    }
    Ok(())
}

/// One NAT gateway per public subnet, up to `count`; egress subnets route
/// through them round-robin
fn add_nat_gateways(stack: &mut Stack, count: u32, subnets: &[SubnetHandle]) -> Result<Vec<ResourceRef>> {
    let mut gateways = Vec::new();
    let public = subnets
        .iter()
        .filter(|s| s.subnet_type == SubnetType::Public)
        .take(count as usize);
    for handle in public {
        let name = stack.path(handle.scope)?.to_string();
        let eip = stack.add_resource(
            handle.scope,
            "EIP",
            &Eip {
                domain: "vpc".to_string(),
                tags: vec![Tag::name(&name)],
            },
        )?;
        let nat = stack.add_resource(
            handle.scope,
            "NATGateway",
            &NatGateway {
                allocation_id: eip.get_att("AllocationId"),
                subnet_id: handle.subnet.to_ref(),
                tags: vec![Tag::name(&name)],
            },
        )?;
        gateways.push(nat);
    }

    if gateways.is_empty() {
        return Ok(gateways);
    }
    let egress = subnets
        .iter()
        .filter(|s| s.subnet_type == SubnetType::PrivateWithEgress);
    for (i, handle) in egress.enumerate() {
        let nat = &gateways[i % gateways.len()];
        stack.add_resource(
            handle.scope,
            "DefaultRoute",
            &Route::to_nat_gateway(handle.route_table.to_ref(), nat.to_ref()),
        )?;
    }
    Ok(gateways)
}

fn add_log_delivery_statements(stack: &mut Stack, bucket: &mut LogBucketConstruct) -> Result<()> {
    let source = json!({
        "StringEquals": { "aws:SourceAccount": Expr::account_id().to_value() },
        "ArnLike": {
            "aws:SourceArn": Expr::sub("arn:${AWS::Partition}:logs:${AWS::Region}:${AWS::AccountId}:*").to_value()
        }
    });
    let mut write_condition = source.clone();
    write_condition["StringEquals"]["s3:x-amz-acl"] = json!("bucket-owner-full-control");

    let objects = Expr::join(
        "",
        vec![bucket.arn(), "/AWSLogs/".into(), Expr::account_id(), "/*".into()],
    );
    bucket.add_to_resource_policy(
        stack,
        Statement::allow(["s3:PutObject"])
            .sid("AWSLogDeliveryWrite")
            .principal(Principal::Service(LOG_DELIVERY_SERVICE.to_string()))
            .resources(vec![objects])
            .condition(write_condition),
    )?;
    bucket.add_to_resource_policy(
        stack,
        Statement::allow(["s3:GetBucketAcl", "s3:ListBucket"])
            .sid("AWSLogDeliveryCheck")
            .principal(Principal::Service(LOG_DELIVERY_SERVICE.to_string()))
            .resources(vec![bucket.arn()])
            .condition(source),
    )
}
