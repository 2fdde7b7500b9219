//! Fargate service and DNS namespace constructs

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use stackgen_cfn::Template;
use stackgen_constructs::fargate::{
    BUSYBOX_IMAGE, HEALTH_CHECK_COMMAND, HEALTH_CHECK_INTERVAL, HEALTH_CHECK_RETRIES,
    HEALTH_CHECK_START_PERIOD, HEALTH_CHECK_TIMEOUT, NGINX_IMAGE,
};
use stackgen_constructs::{
    EcsFargateConstruct, EcsFargateProps, NetworkConstruct, NetworkProps, PrivateDnsNamespace,
    Stack,
};

struct Fixture {
    template: Template,
    network: NetworkConstruct,
    namespace: PrivateDnsNamespace,
    service: EcsFargateConstruct,
}

fn fixture(discovery_name: &str) -> Fixture {
    let mut stack = Stack::new("TestStack").unwrap();
    let root = stack.root();
    let network =
        NetworkConstruct::new(&mut stack, root, "NetworkConstruct", &NetworkProps::default()).unwrap();
    let namespace =
        PrivateDnsNamespace::new(&mut stack, root, "PrivateDnsNamespace", "local", &network).unwrap();
    let service = EcsFargateConstruct::new(
        &mut stack,
        root,
        "EcsFargateConstruct",
        &EcsFargateProps {
            network: &network,
            namespace: &namespace,
            discovery_name,
        },
    )
    .unwrap();
    Fixture {
        template: stack.synth().unwrap().template,
        network,
        namespace,
        service,
    }
}

fn properties<'a>(template: &'a Template, logical_id: &str) -> &'a Value {
    template.resource(logical_id).unwrap().properties()
}

#[test]
fn test_namespace_scoped_to_vpc() {
    let f = fixture("ecs-fargate");
    assert_eq!(f.namespace.namespace_name(), "local");
    assert_eq!(
        properties(&f.template, f.namespace.namespace().logical_id()),
        &json!({ "Name": "local", "Vpc": { "Ref": f.network.vpc().logical_id() } })
    );
}

#[test]
fn test_task_definition_shape() {
    let f = fixture("ecs-fargate");
    let task = properties(&f.template, f.service.task_definition().logical_id());

    assert_eq!(task["Cpu"], json!("256"));
    assert_eq!(task["Memory"], json!("512"));
    assert_eq!(task["NetworkMode"], json!("awsvpc"));
    assert_eq!(task["RequiresCompatibilities"], json!(["FARGATE"]));
    assert_eq!(
        task["RuntimePlatform"],
        json!({ "CpuArchitecture": "ARM64", "OperatingSystemFamily": "LINUX" })
    );
    assert_eq!(
        task["TaskRoleArn"],
        json!({ "Fn::GetAtt": [f.service.task_role().logical_id(), "Arn"] })
    );
    assert!(task["Family"].as_str().unwrap().starts_with("TestStackEcsFargateConstructTaskDefinition"));

    let containers = task["ContainerDefinitions"].as_array().unwrap();
    assert_eq!(containers.len(), 2);
    assert_eq!(
        containers[0],
        json!({
            "Essential": true,
            "HealthCheck": {
                "Command": ["CMD-SHELL", "curl -f http://localhost || exit 1"],
                "Interval": 30,
                "Retries": 2,
                "StartPeriod": 5,
                "Timeout": 15
            },
            "Image": NGINX_IMAGE,
            "Memory": 256,
            "Name": "NginxContainer",
            "PortMappings": [{
                "AppProtocol": "http",
                "ContainerPort": 80,
                "Name": "nginx",
                "Protocol": "tcp"
            }]
        })
    );
    assert_eq!(
        containers[1],
        json!({
            "Essential": true,
            "Image": BUSYBOX_IMAGE,
            "Memory": 128,
            "Name": "BusyboxContainer",
            "PseudoTerminal": true
        })
    );
}

#[test]
fn test_health_check_literals() {
    assert_eq!(HEALTH_CHECK_COMMAND, ["CMD-SHELL", "curl -f http://localhost || exit 1"]);
    assert_eq!(HEALTH_CHECK_RETRIES, 2);
    assert_eq!(HEALTH_CHECK_INTERVAL.to_seconds().unwrap(), 30);
    assert_eq!(HEALTH_CHECK_TIMEOUT.to_seconds().unwrap(), 15);
    assert_eq!(HEALTH_CHECK_START_PERIOD.to_seconds().unwrap(), 5);
}

#[test]
fn test_service_configuration() {
    let f = fixture("ecs-fargate");
    let service = f.template.resource(f.service.service().logical_id()).unwrap();
    let props = service.properties();

    assert_eq!(service.resource_type(), "AWS::ECS::Service");
    assert_eq!(props["LaunchType"], json!("FARGATE"));
    assert_eq!(props["DesiredCount"], json!(2));
    assert_eq!(props["EnableExecuteCommand"], json!(true));
    assert_eq!(
        props["DeploymentConfiguration"]["DeploymentCircuitBreaker"],
        json!({ "Enable": true, "Rollback": true })
    );

    let awsvpc = &props["NetworkConfiguration"]["AwsvpcConfiguration"];
    assert_eq!(awsvpc["AssignPublicIp"], json!("ENABLED"));
    let subnets: Vec<Value> = f
        .network
        .subnets()
        .iter()
        .map(|s| json!({ "Ref": s.subnet.logical_id() }))
        .collect();
    assert_eq!(awsvpc["Subnets"], Value::Array(subnets));

    assert_eq!(
        props["ServiceConnectConfiguration"],
        json!({
            "Enabled": true,
            "Namespace": "local",
            "Services": [{
                "ClientAliases": [{ "DnsName": "ecs-fargate", "Port": 80 }],
                "DiscoveryName": "ecs-fargate",
                "PortName": "nginx"
            }]
        })
    );
    assert!(service.depends_on().contains(f.service.task_role_policy().logical_id()));
}

#[test]
fn test_ingress_only_http_from_vpc_cidr() {
    let f = fixture("ecs-fargate");
    let sg = properties(&f.template, f.service.security_group().logical_id());
    let ingress = sg["SecurityGroupIngress"].as_array().unwrap();

    assert_eq!(ingress.len(), 1);
    assert_eq!(ingress[0]["IpProtocol"], json!("tcp"));
    assert_eq!(ingress[0]["FromPort"], json!(80));
    assert_eq!(ingress[0]["ToPort"], json!(80));
    assert_eq!(
        ingress[0]["CidrIp"],
        json!({ "Fn::GetAtt": [f.network.vpc().logical_id(), "CidrBlock"] })
    );
}

#[test]
fn test_exec_permissions_on_task_role() {
    let f = fixture("ecs-fargate");
    let policy = properties(&f.template, f.service.task_role_policy().logical_id());
    let actions = &policy["PolicyDocument"]["Statement"][0]["Action"];
    assert_eq!(
        actions,
        &json!([
            "ssmmessages:CreateControlChannel",
            "ssmmessages:CreateDataChannel",
            "ssmmessages:OpenControlChannel",
            "ssmmessages:OpenDataChannel"
        ])
    );
    assert_eq!(policy["PolicyName"], json!(f.service.task_role_policy().logical_id()));
}

#[test]
fn test_discovery_name_changes_only_service_connect() {
    let a = fixture("ecs-fargate");
    let b = fixture("other");

    for ((id_a, res_a), (id_b, res_b)) in a.template.resources().zip(b.template.resources()) {
        assert_eq!(id_a, id_b);
        if res_a.resource_type() == "AWS::ECS::Service" {
            let mut pa = res_a.properties().clone();
            let mut pb = res_b.properties().clone();
            assert_ne!(pa["ServiceConnectConfiguration"], pb["ServiceConnectConfiguration"]);
            pa["ServiceConnectConfiguration"] = Value::Null;
            pb["ServiceConnectConfiguration"] = Value::Null;
            assert_eq!(pa, pb);
        } else {
            assert_eq!(res_a, res_b);
        }
    }
}
