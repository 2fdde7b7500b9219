//! `AWS::EC2::*`

use serde::Serialize;

use super::Tag;
use crate::expr::Expr;
use crate::resource::ResourceProperties;

/// `AWS::EC2::VPC`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Vpc {
    /// DNS hostnames and support on, default tenancy
    #[must_use]
    pub fn new(cidr_block: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            cidr_block: cidr_block.into(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
            instance_tenancy: "default".to_string(),
            tags,
        }
    }
}

impl ResourceProperties for Vpc {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::VPC";
}

/// `AWS::EC2::Subnet`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub availability_zone: Expr,
    pub cidr_block: String,
    pub map_public_ip_on_launch: bool,
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for Subnet {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::Subnet";
}

/// `AWS::EC2::RouteTable`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for RouteTable {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::RouteTable";
}

/// `AWS::EC2::SubnetRouteTableAssociation`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociation {
    pub route_table_id: Expr,
    pub subnet_id: Expr,
}

impl ResourceProperties for SubnetRouteTableAssociation {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::SubnetRouteTableAssociation";
}

/// `AWS::EC2::Route`
///
/// Exactly one of the target fields is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    pub route_table_id: Expr,
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Expr>,
}

impl Route {
    /// Default route through an internet gateway
    #[must_use]
    pub fn to_gateway(route_table_id: Expr, gateway_id: Expr) -> Self {
        Self {
            route_table_id,
            destination_cidr_block: ANY_IPV4.to_string(),
            gateway_id: Some(gateway_id),
            nat_gateway_id: None,
        }
    }

    /// Default route through a NAT gateway
    #[must_use]
    pub fn to_nat_gateway(route_table_id: Expr, nat_gateway_id: Expr) -> Self {
        Self {
            route_table_id,
            destination_cidr_block: ANY_IPV4.to_string(),
            gateway_id: None,
            nat_gateway_id: Some(nat_gateway_id),
        }
    }
}

impl ResourceProperties for Route {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::Route";
}

/// `0.0.0.0/0`
pub const ANY_IPV4: &str = "0.0.0.0/0";

/// `AWS::EC2::InternetGateway`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for InternetGateway {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::InternetGateway";
}

/// `AWS::EC2::VPCGatewayAttachment`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachment {
    pub vpc_id: Expr,
    pub internet_gateway_id: Expr,
}

impl ResourceProperties for VpcGatewayAttachment {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::VPCGatewayAttachment";
}

/// `AWS::EC2::EIP`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Eip {
    pub domain: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for Eip {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::EIP";
}

/// `AWS::EC2::NatGateway`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatGateway {
    pub allocation_id: Expr,
    pub subnet_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for NatGateway {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::NatGateway";
}

/// `AWS::EC2::VPCEndpoint`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcEndpoint {
    pub service_name: Expr,
    pub vpc_id: Expr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub route_table_ids: Vec<Expr>,
    pub vpc_endpoint_type: String,
}

impl VpcEndpoint {
    /// Gateway endpoint for `service` (e.g. `s3`) in the stack's region
    #[must_use]
    pub fn gateway(service: &str, vpc_id: Expr, route_table_ids: Vec<Expr>) -> Self {
        Self {
            service_name: Expr::sub(format!("com.amazonaws.${{AWS::Region}}.{service}")),
            vpc_id,
            route_table_ids,
            vpc_endpoint_type: "Gateway".to_string(),
        }
    }
}

impl ResourceProperties for VpcEndpoint {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::VPCEndpoint";
}

/// `AWS::EC2::FlowLog`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FlowLog {
    pub resource_id: Expr,
    pub resource_type: String,
    pub traffic_type: String,
    pub log_destination_type: String,
    pub log_destination: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
    pub max_aggregation_interval: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_options: Option<FlowLogDestinationOptions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for FlowLog {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::FlowLog";
}

/// S3 delivery options of a flow log
///
/// Free-form JSON on the CloudFormation side, keyed in camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowLogDestinationOptions {
    pub file_format: String,
    pub hive_compatible_partitions: bool,
    pub per_hour_partition: bool,
}

/// `AWS::EC2::SecurityGroup`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub group_description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_egress: Vec<SecurityGroupRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ingress: Vec<SecurityGroupRule>,
    pub vpc_id: Expr,
}

impl ResourceProperties for SecurityGroup {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::SecurityGroup";
}

/// Inline ingress or egress rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    pub cidr_ip: Expr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<u16>,
    pub ip_protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<u16>,
}

impl SecurityGroupRule {
    /// All traffic to anywhere
    #[must_use]
    pub fn allow_all_outbound() -> Self {
        Self {
            cidr_ip: Expr::from(ANY_IPV4),
            description: Some("Allow all outbound traffic by default".to_string()),
            from_port: None,
            ip_protocol: "-1".to_string(),
            to_port: None,
        }
    }

    /// One TCP port from `cidr`
    #[must_use]
    pub fn tcp(cidr: Expr, port: u16, description: impl Into<String>) -> Self {
        Self {
            cidr_ip: cidr,
            description: Some(description.into()),
            from_port: Some(port),
            ip_protocol: "tcp".to_string(),
            to_port: Some(port),
        }
    }
}
