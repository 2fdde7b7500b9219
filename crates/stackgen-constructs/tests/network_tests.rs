//! Network construct: address plan, gateways and flow logs

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use stackgen_cfn::{Duration, Template};
use stackgen_constructs::{
    ConstructError, LifecycleRule, LogField, NetworkConstruct, NetworkProps, Stack,
    SubnetConfiguration, SubnetType,
};
use stackgen_graph::GraphError;

fn build(props: &NetworkProps) -> Result<(Stack, NetworkConstruct), ConstructError> {
    let mut stack = Stack::new("TestStack")?;
    let root = stack.root();
    let network = NetworkConstruct::new(&mut stack, root, "NetworkConstruct", props)?;
    Ok((stack, network))
}

fn count(template: &Template, resource_type: &str) -> usize {
    template.resources_of_type(resource_type).count()
}

#[test]
fn test_default_network_shape() {
    let (stack, network) = build(&NetworkProps::default()).unwrap();
    let template = stack.synth().unwrap().template;

    assert_eq!(count(&template, "AWS::EC2::VPC"), 1);
    assert_eq!(count(&template, "AWS::EC2::Subnet"), 2);
    assert_eq!(count(&template, "AWS::EC2::NatGateway"), 0);
    assert_eq!(count(&template, "AWS::EC2::EIP"), 0);
    assert_eq!(count(&template, "AWS::EC2::InternetGateway"), 1);
    assert_eq!(count(&template, "AWS::EC2::VPCGatewayAttachment"), 1);
    assert_eq!(count(&template, "AWS::EC2::Route"), 2);

    let cidrs: Vec<String> = network.subnets().iter().map(|s| s.cidr.to_string()).collect();
    assert_eq!(cidrs, vec!["10.10.0.0/27", "10.10.0.32/27"]);

    let vpc = template.resource(network.vpc().logical_id()).unwrap();
    assert_eq!(vpc.property("EnableDnsHostnames"), Some(&json!(true)));
    assert_eq!(vpc.property("EnableDnsSupport"), Some(&json!(true)));
    assert_eq!(vpc.property("CidrBlock"), Some(&json!("10.10.0.0/20")));
}

#[test]
fn test_public_subnets_tagged_and_spread_over_zones() {
    let (stack, network) = build(&NetworkProps::default()).unwrap();
    let template = stack.synth().unwrap().template;

    for (i, handle) in network.subnets().iter().enumerate() {
        let subnet = template.resource(handle.subnet.logical_id()).unwrap();
        assert_eq!(subnet.property("MapPublicIpOnLaunch"), Some(&json!(true)));
        assert_eq!(
            subnet.property("AvailabilityZone"),
            Some(&json!({ "Fn::Select": [i, { "Fn::GetAZs": "" }] }))
        );
        let tags = subnet.property("Tags").unwrap().as_array().unwrap();
        assert!(tags.contains(&json!({ "Key": "aws-cdk:subnet-type", "Value": "Public" })));
        assert!(tags.contains(&json!({ "Key": "aws-cdk:subnet-name", "Value": "public" })));
    }
}

#[test]
fn test_default_routes_wait_for_gateway_attachment() {
    let (stack, _) = build(&NetworkProps::default()).unwrap();
    let template = stack.synth().unwrap().template;

    let (attachment, _) = template
        .resources_of_type("AWS::EC2::VPCGatewayAttachment")
        .next()
        .unwrap();
    for (_, route) in template.resources_of_type("AWS::EC2::Route") {
        assert!(route.depends_on().contains(attachment));
        assert_eq!(route.property("DestinationCidrBlock"), Some(&json!("0.0.0.0/0")));
    }
}

#[test]
fn test_s3_gateway_endpoint_on_every_route_table() {
    let (stack, network) = build(&NetworkProps::default()).unwrap();
    let template = stack.synth().unwrap().template;

    let endpoint = template.resource(network.s3_endpoint().logical_id()).unwrap();
    assert_eq!(endpoint.property("VpcEndpointType"), Some(&json!("Gateway")));
    assert_eq!(
        endpoint.property("ServiceName"),
        Some(&json!({ "Fn::Sub": "com.amazonaws.${AWS::Region}.s3" }))
    );
    assert_eq!(
        endpoint.property("RouteTableIds").unwrap().as_array().unwrap().len(),
        network.subnets().len()
    );
}

#[test]
fn test_private_egress_subnets_route_through_nat() {
    let props = NetworkProps {
        subnet_configurations: vec![
            SubnetConfiguration {
                name: "public".into(),
                subnet_type: SubnetType::Public,
                cidr_mask: 24,
            },
            SubnetConfiguration {
                name: "private".into(),
                subnet_type: SubnetType::PrivateWithEgress,
                cidr_mask: 24,
            },
        ],
        nat_gateways: 1,
        ..NetworkProps::default()
    };
    let (stack, network) = build(&props).unwrap();
    let template = stack.synth().unwrap().template;

    assert_eq!(network.nat_gateways().len(), 1);
    assert_eq!(count(&template, "AWS::EC2::EIP"), 1);

    let nat = network.nat_gateways()[0].logical_id();
    let nat_routes = template
        .resources_of_type("AWS::EC2::Route")
        .filter(|(_, r)| r.property("NatGatewayId") == Some(&json!({ "Ref": nat })))
        .count();
    assert_eq!(nat_routes, 2);

    let private: Vec<_> = network.subnets_of_type(SubnetType::PrivateWithEgress).collect();
    assert_eq!(private[0].cidr.to_string(), "10.10.2.0/24");
    assert_eq!(
        template
            .resource(private[0].subnet.logical_id())
            .unwrap()
            .property("MapPublicIpOnLaunch"),
        Some(&json!(false))
    );
}

#[test]
fn test_invalid_plans_rejected() {
    let no_public = NetworkProps {
        subnet_configurations: vec![SubnetConfiguration {
            name: "isolated".into(),
            subnet_type: SubnetType::PrivateIsolated,
            cidr_mask: 24,
        }],
        nat_gateways: 1,
        ..NetworkProps::default()
    };
    assert!(matches!(
        build(&no_public),
        Err(ConstructError::NatWithoutPublicSubnet { nat_gateways: 1 })
    ));

    let no_zones = NetworkProps {
        max_azs: 0,
        ..NetworkProps::default()
    };
    assert!(matches!(build(&no_zones), Err(ConstructError::NoAvailabilityZones)));

    let too_small = NetworkProps {
        vpc_cidr: "10.0.0.0/24".into(),
        subnet_configurations: vec![SubnetConfiguration {
            name: "public".into(),
            subnet_type: SubnetType::Public,
            cidr_mask: 25,
        }],
        max_azs: 3,
        ..NetworkProps::default()
    };
    assert!(matches!(build(&too_small), Err(ConstructError::CidrExhausted { .. })));

    let bad_cidr = NetworkProps {
        vpc_cidr: "10.10.0.1/20".into(),
        ..NetworkProps::default()
    };
    assert!(matches!(build(&bad_cidr), Err(ConstructError::InvalidCidr(_))));
}

#[test]
fn test_zone_count_bounded_by_vpc_block() {
    let absurd = NetworkProps {
        max_azs: u32::MAX,
        ..NetworkProps::default()
    };
    assert!(matches!(
        build(&absurd),
        Err(ConstructError::CidrExhausted { mask: 28, .. })
    ));

    // a /24 holds sixteen /28 blocks
    let zones: Vec<String> = (0..17).map(|i| format!("zone-{i}")).collect();
    let listed = NetworkProps {
        vpc_cidr: "10.0.0.0/24".into(),
        availability_zones: Some(zones),
        ..NetworkProps::default()
    };
    assert!(matches!(build(&listed), Err(ConstructError::CidrExhausted { .. })));
}

#[test]
fn test_subnet_names_allow_dashes() {
    let props = |name: &str| NetworkProps {
        subnet_configurations: vec![SubnetConfiguration {
            name: name.into(),
            subnet_type: SubnetType::Public,
            cidr_mask: 27,
        }],
        ..NetworkProps::default()
    };
    assert!(build(&props("web-tier")).is_ok());

    let err = build(&props("web tier")).unwrap_err();
    assert!(matches!(err, ConstructError::InvalidSubnetConfiguration(_)));
    assert!(err.to_string().contains("letters, digits or '-'"), "{err}");
}

#[test]
fn test_explicit_zones_override_max_azs() {
    let props = NetworkProps {
        availability_zones: Some(vec!["ap-northeast-1a".into(), "ap-northeast-1c".into(), "ap-northeast-1d".into()]),
        ..NetworkProps::default()
    };
    let (stack, network) = build(&props).unwrap();
    let template = stack.synth().unwrap().template;

    assert_eq!(network.subnets().len(), 3);
    let last = template.resource(network.subnets()[2].subnet.logical_id()).unwrap();
    assert_eq!(last.property("AvailabilityZone"), Some(&json!("ap-northeast-1d")));
}

#[test]
fn test_flow_log_to_bucket() {
    let (mut stack, mut network) = build(&NetworkProps::default()).unwrap();
    let handle = network.add_flow_log(&mut stack, None).unwrap().clone();
    let template = stack.synth().unwrap().template;

    let flow_log = template.resource(handle.flow_log.logical_id()).unwrap();
    assert_eq!(flow_log.resource_type(), "AWS::EC2::FlowLog");
    assert_eq!(flow_log.property("ResourceType"), Some(&json!("VPC")));
    assert_eq!(flow_log.property("TrafficType"), Some(&json!("ALL")));
    assert_eq!(flow_log.property("LogDestinationType"), Some(&json!("s3")));
    assert_eq!(flow_log.property("MaxAggregationInterval"), Some(&json!(600)));
    assert_eq!(
        flow_log.property("LogDestination"),
        Some(&json!({ "Fn::GetAtt": [handle.bucket.bucket().logical_id(), "Arn"] }))
    );
    assert_eq!(
        flow_log.property("DestinationOptions"),
        Some(&json!({
            "fileFormat": "plain-text",
            "hiveCompatiblePartitions": false,
            "perHourPartition": true
        }))
    );
    assert!(flow_log.depends_on().contains(handle.bucket.policy().logical_id()));

    let format = flow_log.property("LogFormat").unwrap().as_str().unwrap();
    let fields: Vec<&str> = format.split(' ').collect();
    assert_eq!(fields.len(), LogField::standard_with_ecs().len());
    assert_eq!(fields[0], "${version}");
    assert_eq!(fields[29], "${ecs-cluster-name}");
    assert_eq!(fields[38], "${ecs-second-container-id}");

    let bucket = template.resource(handle.bucket.bucket().logical_id()).unwrap();
    assert_eq!(
        bucket.property("LifecycleConfiguration"),
        Some(&json!({
            "Rules": [{
                "AbortIncompleteMultipartUpload": { "DaysAfterInitiation": 30 },
                "ExpirationInDays": 365,
                "Id": "Delete-After-365Days",
                "Status": "Enabled"
            }]
        }))
    );

    let policy = template.resource(handle.bucket.policy().logical_id()).unwrap();
    let statements = policy.properties()["PolicyDocument"]["Statement"].as_array().unwrap();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[1]["Principal"], json!({ "Service": "delivery.logs.amazonaws.com" }));
    assert_eq!(
        statements[1]["Condition"]["StringEquals"]["s3:x-amz-acl"],
        json!("bucket-owner-full-control")
    );
}

#[test]
fn test_flow_log_attached_once() {
    let (mut stack, mut network) = build(&NetworkProps::default()).unwrap();
    network.add_flow_log(&mut stack, None).unwrap();
    assert!(matches!(
        network.add_flow_log(&mut stack, None),
        Err(ConstructError::FlowLogAlreadyAttached(_))
    ));
}

#[test]
fn test_flow_log_rejects_duplicate_rule_ids() {
    let mut props = NetworkProps::default();
    props.vpc_flow_logs.lifecycle_rules = vec![
        LifecycleRule::expire_after_days(30),
        LifecycleRule::expire_after_days(30),
    ];
    let (mut stack, mut network) = build(&props).unwrap();
    assert!(matches!(
        network.add_flow_log(&mut stack, None),
        Err(ConstructError::DuplicateLifecycleRuleId(_))
    ));
}

#[test]
fn test_failed_flow_log_declares_nothing() {
    let (mut stack, mut network) = build(&NetworkProps::default()).unwrap();
    let before = stack.resource_count();
    let root = stack.root();

    let err = network.add_flow_log(&mut stack, Some(root)).unwrap_err();
    assert!(matches!(err, ConstructError::Graph(GraphError::NestedDependency { .. })));
    assert_eq!(stack.resource_count(), before);
    assert!(network.flow_log().is_none());
    for id in ["FlowLogsBucket", "FlowLogsToS3"] {
        assert_eq!(stack.graph().tree().child(network.node(), id), None);
    }

    network.add_flow_log(&mut stack, None).unwrap();
    assert!(network.flow_log().is_some());
    stack.synth().unwrap();
}

#[test]
fn test_flow_log_rejects_oversized_multipart_window() {
    let mut props = NetworkProps::default();
    props.vpc_flow_logs.lifecycle_rules = vec![LifecycleRule::expire_after_days(1)
        .abort_multipart_after(Duration::days(u64::MAX / 1000))];
    let (mut stack, mut network) = build(&props).unwrap();
    let before = stack.resource_count();

    assert!(matches!(
        network.add_flow_log(&mut stack, None),
        Err(ConstructError::InvalidLifecycleRule { .. })
    ));
    assert_eq!(stack.resource_count(), before);
}

proptest! {
    #[test]
    fn prop_one_public_subnet_per_zone(max_azs in 1u32..=6, mask in 24u8..=28) {
        let props = NetworkProps {
            vpc_cidr: "10.0.0.0/16".into(),
            subnet_configurations: vec![SubnetConfiguration {
                name: "public".into(),
                subnet_type: SubnetType::Public,
                cidr_mask: mask,
            }],
            max_azs,
            ..NetworkProps::default()
        };
        let (stack, network) = build(&props).unwrap();
        let template = stack.synth().unwrap().template;

        prop_assert_eq!(network.subnets_of_type(SubnetType::Public).count(), max_azs as usize);
        prop_assert_eq!(count(&template, "AWS::EC2::NatGateway"), 0);

        let blocks: Vec<_> = network.subnets().iter().map(|s| s.cidr).collect();
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                prop_assert!(!a.contains(b) && !b.contains(a));
            }
        }
    }
}
