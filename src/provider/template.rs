//! CloudFormation-shaped template rendering.
//!
//! The template is the offline hand-off document: a provisioning framework
//! deploys it, this crate only writes it.

use serde_json::{json, Map, Value};

use crate::planner::MachineImageRef;
use crate::stack::StackDescriptor;

use super::user_data::render_multipart;

/// Template format version.
const FORMAT_VERSION: &str = "2010-09-09";

/// SSM parameter resolving to the latest Amazon Linux 2 image.
const AMAZON_LINUX_2_PARAMETER: &str =
    "{{resolve:ssm:/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2}}";

/// Prefix of AWS managed policy ARNs.
const MANAGED_POLICY_ARN_PREFIX: &str = "arn:aws:iam::aws:policy/";

/// Converts a kebab-case id into an alphanumeric logical id (`ds-vpc` -> `DsVpc`).
#[must_use]
pub fn logical_id(id: &str) -> String {
    id.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + chars.as_str()
            })
        })
        .collect()
}

/// Renders the template for a stack.
#[must_use]
pub fn render_template(stack: &StackDescriptor) -> Value {
    let network = &stack.network;
    let vpc = logical_id(&network.logical_id);
    let gateway = logical_id(&network.internet_gateway);
    let attachment = format!("{gateway}Attachment");
    let subnet = logical_id(&network.subnet.logical_id);
    let route_table = logical_id(&network.subnet.route_table);
    let default_route = format!("{route_table}DefaultRoute");
    let association = format!("{subnet}RouteTableAssociation");
    let role = logical_id(&stack.role.logical_id);
    let profile = logical_id(&stack.role.instance_profile);
    let security_group = logical_id(&stack.security_group.logical_id);
    let instance = logical_id(&stack.instance.logical_id);

    let mut resources = Map::new();

    resources.insert(
        vpc.clone(),
        json!({
            "Type": "AWS::EC2::VPC",
            "Properties": {
                "CidrBlock": network.cidr,
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
            }
        }),
    );

    resources.insert(
        gateway.clone(),
        json!({ "Type": "AWS::EC2::InternetGateway" }),
    );

    resources.insert(
        attachment.clone(),
        json!({
            "Type": "AWS::EC2::VPCGatewayAttachment",
            "Properties": {
                "VpcId": { "Ref": vpc },
                "InternetGatewayId": { "Ref": gateway },
            }
        }),
    );

    resources.insert(
        subnet.clone(),
        json!({
            "Type": "AWS::EC2::Subnet",
            "Properties": {
                "VpcId": { "Ref": vpc },
                "CidrBlock": network.subnet.cidr,
                "MapPublicIpOnLaunch": network.subnet.map_public_ip_on_launch,
                "AvailabilityZone": { "Fn::Select": [0, { "Fn::GetAZs": "" }] },
            }
        }),
    );

    resources.insert(
        route_table.clone(),
        json!({
            "Type": "AWS::EC2::RouteTable",
            "Properties": { "VpcId": { "Ref": vpc } }
        }),
    );

    resources.insert(
        default_route.clone(),
        json!({
            "Type": "AWS::EC2::Route",
            "DependsOn": [attachment],
            "Properties": {
                "RouteTableId": { "Ref": route_table },
                "DestinationCidrBlock": "0.0.0.0/0",
                "GatewayId": { "Ref": gateway },
            }
        }),
    );

    resources.insert(
        association,
        json!({
            "Type": "AWS::EC2::SubnetRouteTableAssociation",
            "Properties": {
                "RouteTableId": { "Ref": route_table },
                "SubnetId": { "Ref": subnet },
            }
        }),
    );

    let policy_arns: Vec<String> = stack
        .role
        .managed_policies
        .iter()
        .map(|name| format!("{MANAGED_POLICY_ARN_PREFIX}{name}"))
        .collect();

    resources.insert(
        role.clone(),
        json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "RoleName": stack.role.role_name,
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Action": "sts:AssumeRole",
                        "Effect": "Allow",
                        "Principal": { "Service": stack.role.assumed_by },
                    }],
                },
                "ManagedPolicyArns": policy_arns,
            }
        }),
    );

    resources.insert(
        profile.clone(),
        json!({
            "Type": "AWS::IAM::InstanceProfile",
            "Properties": { "Roles": [{ "Ref": role }] }
        }),
    );

    let egress = if stack.security_group.allow_all_outbound {
        json!([{ "CidrIp": "0.0.0.0/0", "IpProtocol": "-1", "Description": "Allow all outbound traffic by default" }])
    } else {
        json!([])
    };

    resources.insert(
        security_group.clone(),
        json!({
            "Type": "AWS::EC2::SecurityGroup",
            "Properties": {
                "GroupName": stack.security_group.name,
                "GroupDescription": format!("{}/{}", stack.stack_name, stack.security_group.name),
                "VpcId": { "Ref": vpc },
                "SecurityGroupEgress": egress,
                "SecurityGroupIngress": stack.security_group.ingress,
            }
        }),
    );

    let image_id = match &stack.instance.machine_image {
        MachineImageRef::LatestAmazonLinux { .. } => Value::from(AMAZON_LINUX_2_PARAMETER),
        MachineImageRef::Generic { image_id, .. } => Value::from(image_id.as_str()),
    };

    let block_devices: Vec<Value> = stack
        .instance
        .block_devices
        .iter()
        .map(|device| {
            json!({
                "DeviceName": device.device_name,
                "Ebs": { "VolumeSize": device.volume_size_gib },
            })
        })
        .collect();

    resources.insert(
        instance,
        json!({
            "Type": "AWS::EC2::Instance",
            "DependsOn": [role, default_route],
            "Properties": {
                "InstanceType": stack.instance.instance_type,
                "ImageId": image_id,
                "SubnetId": { "Ref": subnet },
                "IamInstanceProfile": { "Ref": profile },
                "SecurityGroupIds": [{ "Fn::GetAtt": [security_group, "GroupId"] }],
                "BlockDeviceMappings": block_devices,
                "UserData": { "Fn::Base64": render_multipart(&stack.instance.user_data) },
            }
        }),
    );

    json!({
        "AWSTemplateFormatVersion": FORMAT_VERSION,
        "Description": format!("{}: data-science instance reachable through session manager", stack.stack_name),
        "Metadata": {
            "ds-ec2": {
                "planHash": stack.plan_hash,
                "region": stack.region,
                "machineImage": stack.instance.machine_image.to_string(),
            }
        },
        "Resources": resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProvisioningRequest, StackSettings};
    use crate::planner::ResourcePlanner;
    use crate::stack::StackAssembler;

    fn stack_for(instance_type: &str) -> StackDescriptor {
        let request = ProvisioningRequest::new(
            "us-east-1",
            instance_type,
            Some(String::from("ami-0gpu")),
            vec![String::from("pandas")],
        );
        let plan = ResourcePlanner::default().plan(&request).unwrap();
        StackAssembler::new(&StackSettings::default()).assemble(&plan, "us-east-1")
    }

    #[test]
    fn test_logical_id() {
        assert_eq!(logical_id("ds-vpc"), "DsVpc");
        assert_eq!(logical_id("ds-ec2-role"), "DsEc2Role");
        assert_eq!(logical_id("--x--"), "X");
    }

    #[test]
    fn test_template_resources() {
        let template = render_template(&stack_for("c4.2xlarge"));
        let resources = template["Resources"].as_object().unwrap();

        assert_eq!(resources.len(), 11);
        assert_eq!(resources["DsVpc"]["Type"], "AWS::EC2::VPC");
        assert_eq!(resources["DsVpc"]["Properties"]["CidrBlock"], "10.0.0.0/16");
        assert_eq!(resources["DsEc2InstanceProfile"]["Type"], "AWS::IAM::InstanceProfile");
        assert_eq!(
            resources["DsEc2InstanceProfile"]["Properties"]["Roles"][0]["Ref"],
            "DsEc2Role"
        );
        assert_eq!(
            resources["DsEc2Role"]["Properties"]["ManagedPolicyArns"][0],
            "arn:aws:iam::aws:policy/AmazonSSMManagedInstanceCore"
        );
        assert_eq!(
            resources["DsSecurityGroup"]["Properties"]["SecurityGroupEgress"][0]["CidrIp"],
            "0.0.0.0/0"
        );
    }

    #[test]
    fn test_instance_is_placed_in_routed_subnet() {
        let template = render_template(&stack_for("c4.2xlarge"));
        let resources = template["Resources"].as_object().unwrap();

        let subnet = &resources["DsPublicSubnet"];
        assert_eq!(subnet["Type"], "AWS::EC2::Subnet");
        assert_eq!(subnet["Properties"]["VpcId"]["Ref"], "DsVpc");
        assert_eq!(subnet["Properties"]["CidrBlock"], "10.0.0.0/24");
        assert_eq!(subnet["Properties"]["MapPublicIpOnLaunch"], true);

        let route = &resources["DsPublicRouteTableDefaultRoute"]["Properties"];
        assert_eq!(route["DestinationCidrBlock"], "0.0.0.0/0");
        assert_eq!(route["GatewayId"]["Ref"], "DsIgw");
        assert_eq!(
            resources["DsPublicSubnetRouteTableAssociation"]["Properties"]["SubnetId"]["Ref"],
            "DsPublicSubnet"
        );
        assert_eq!(
            resources["DsIgwAttachment"]["Properties"]["VpcId"]["Ref"],
            "DsVpc"
        );

        let instance = &resources["DsInstance"];
        assert_eq!(instance["Properties"]["SubnetId"]["Ref"], "DsPublicSubnet");
        assert_eq!(
            instance["DependsOn"],
            serde_json::json!(["DsEc2Role", "DsPublicRouteTableDefaultRoute"])
        );
        assert_eq!(
            resources["DsSecurityGroup"]["Properties"]["VpcId"]["Ref"],
            "DsVpc"
        );
    }

    #[test]
    fn test_cpu_instance_uses_latest_image() {
        let template = render_template(&stack_for("c4.2xlarge"));
        let props = &template["Resources"]["DsInstance"]["Properties"];

        assert_eq!(props["ImageId"], AMAZON_LINUX_2_PARAMETER);
        assert_eq!(props["BlockDeviceMappings"][0]["Ebs"]["VolumeSize"], 25);
        assert_eq!(props["BlockDeviceMappings"][0]["DeviceName"], "/dev/xvda");
    }

    #[test]
    fn test_gpu_instance_uses_custom_image() {
        let template = render_template(&stack_for("p3.2xlarge"));
        let props = &template["Resources"]["DsInstance"]["Properties"];

        assert_eq!(props["ImageId"], "ami-0gpu");
        assert_eq!(props["BlockDeviceMappings"][0]["Ebs"]["VolumeSize"], 60);
        let user_data = props["UserData"]["Fn::Base64"].as_str().unwrap();
        assert!(user_data.contains("source activate pytorch;  pip install pandas"));
    }
}
