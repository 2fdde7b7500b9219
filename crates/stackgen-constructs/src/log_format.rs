//! Flow log record fields

use std::fmt;

/// One field of a custom flow log record format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogField {
    Version,
    AccountId,
    InterfaceId,
    SrcAddr,
    DstAddr,
    SrcPort,
    DstPort,
    Protocol,
    Packets,
    Bytes,
    Start,
    End,
    Action,
    LogStatus,
    VpcId,
    SubnetId,
    InstanceId,
    TcpFlags,
    Type,
    PktSrcAddr,
    PktDstAddr,
    Region,
    AzId,
    SublocationType,
    SublocationId,
    PktSrcAwsService,
    PktDstAwsService,
    FlowDirection,
    TrafficPath,
    EcsClusterName,
    EcsClusterArn,
    EcsContainerInstanceId,
    EcsContainerInstanceArn,
    EcsServiceName,
    EcsTaskDefinitionArn,
    EcsTaskId,
    EcsTaskArn,
    EcsContainerId,
    EcsSecondContainerId,
}

impl LogField {
    /// Version 2 to 5 fields, in record order
    pub const STANDARD: [Self; 29] = [
        Self::Version,
        Self::AccountId,
        Self::InterfaceId,
        Self::SrcAddr,
        Self::DstAddr,
        Self::SrcPort,
        Self::DstPort,
        Self::Protocol,
        Self::Packets,
        Self::Bytes,
        Self::Start,
        Self::End,
        Self::Action,
        Self::LogStatus,
        Self::VpcId,
        Self::SubnetId,
        Self::InstanceId,
        Self::TcpFlags,
        Self::Type,
        Self::PktSrcAddr,
        Self::PktDstAddr,
        Self::Region,
        Self::AzId,
        Self::SublocationType,
        Self::SublocationId,
        Self::PktSrcAwsService,
        Self::PktDstAwsService,
        Self::FlowDirection,
        Self::TrafficPath,
    ];

    /// Version 7 ECS fields
    pub const ECS: [Self; 10] = [
        Self::EcsClusterName,
        Self::EcsClusterArn,
        Self::EcsContainerInstanceId,
        Self::EcsContainerInstanceArn,
        Self::EcsServiceName,
        Self::EcsTaskDefinitionArn,
        Self::EcsTaskId,
        Self::EcsTaskArn,
        Self::EcsContainerId,
        Self::EcsSecondContainerId,
    ];

    /// Field name as used inside `${...}`
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::AccountId => "account-id",
            Self::InterfaceId => "interface-id",
            Self::SrcAddr => "srcaddr",
            Self::DstAddr => "dstaddr",
            Self::SrcPort => "srcport",
            Self::DstPort => "dstport",
            Self::Protocol => "protocol",
            Self::Packets => "packets",
            Self::Bytes => "bytes",
            Self::Start => "start",
            Self::End => "end",
            Self::Action => "action",
            Self::LogStatus => "log-status",
            Self::VpcId => "vpc-id",
            Self::SubnetId => "subnet-id",
            Self::InstanceId => "instance-id",
            Self::TcpFlags => "tcp-flags",
            Self::Type => "type",
            Self::PktSrcAddr => "pkt-srcaddr",
            Self::PktDstAddr => "pkt-dstaddr",
            Self::Region => "region",
            Self::AzId => "az-id",
            Self::SublocationType => "sublocation-type",
            Self::SublocationId => "sublocation-id",
            Self::PktSrcAwsService => "pkt-src-aws-service",
            Self::PktDstAwsService => "pkt-dst-aws-service",
            Self::FlowDirection => "flow-direction",
            Self::TrafficPath => "traffic-path",
            Self::EcsClusterName => "ecs-cluster-name",
            Self::EcsClusterArn => "ecs-cluster-arn",
            Self::EcsContainerInstanceId => "ecs-container-instance-id",
            Self::EcsContainerInstanceArn => "ecs-container-instance-arn",
            Self::EcsServiceName => "ecs-service-name",
            Self::EcsTaskDefinitionArn => "ecs-task-definition-arn",
            Self::EcsTaskId => "ecs-task-id",
            Self::EcsTaskArn => "ecs-task-arn",
            Self::EcsContainerId => "ecs-container-id",
            Self::EcsSecondContainerId => "ecs-second-container-id",
        }
    }

    /// Standard fields followed by the ECS fields
    #[must_use]
    pub fn standard_with_ecs() -> Vec<Self> {
        Self::STANDARD.iter().chain(Self::ECS.iter()).copied().collect()
    }
}

impl fmt::Display for LogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.name())
    }
}

/// `${a} ${b} ...`
#[must_use]
pub fn render_log_format(fields: &[LogField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_single_spaced_placeholders() {
        assert_eq!(
            render_log_format(&[LogField::Version, LogField::EcsTaskId]),
            "${version} ${ecs-task-id}"
        );
    }

    #[test]
    fn standard_with_ecs_ends_with_ecs_fields() {
        let fields = LogField::standard_with_ecs();
        assert_eq!(fields.len(), 39);
        assert_eq!(fields[0], LogField::Version);
        assert_eq!(fields[28], LogField::TrafficPath);
        assert_eq!(&fields[29..], &LogField::ECS);

        let rendered = render_log_format(&fields);
        assert!(!rendered.contains("  "));
        assert!(rendered.ends_with("${ecs-container-id} ${ecs-second-container-id}"));
    }
}
