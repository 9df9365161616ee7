//! `services.k8s.aws/v1alpha1` kinds managed by the EKS ACK controller

use super::{reference, reference_list};
use crate::definition::CrdDefinition;
use crate::schema::{Attribute, Validator};

const GROUP: &str = "services.k8s.aws";
const VERSION: &str = "v1alpha1";

pub const ADDON: CrdDefinition = CrdDefinition {
    group: GROUP,
    version: VERSION,
    kind: "Addon",
    plural: "addons",
    description: "AddonSpec defines the desired state of an EKS add-on.",
    spec: addon_spec,
};

pub const CLUSTER: CrdDefinition = CrdDefinition {
    group: GROUP,
    version: VERSION,
    kind: "Cluster",
    plural: "clusters",
    description: "ClusterSpec defines the desired state of an EKS cluster.",
    spec: cluster_spec,
};

pub const NODEGROUP: CrdDefinition = CrdDefinition {
    group: GROUP,
    version: VERSION,
    kind: "Nodegroup",
    plural: "nodegroups",
    description: "NodegroupSpec defines the desired state of an EKS managed node group.",
    spec: nodegroup_spec,
};

fn tags() -> Attribute {
    Attribute::string_map("tags")
        .optional()
        .description("Metadata that assists with categorization and organization.")
}

fn addon_spec() -> Vec<Attribute> {
    vec![
        Attribute::string("name")
            .required()
            .description("The name of the add-on.")
            .validator(Validator::length_at_least(1)),
        Attribute::string("addon_version")
            .optional()
            .description("The version of the add-on."),
        Attribute::string("cluster_name")
            .optional()
            .description("The name of the cluster to create the add-on for."),
        reference("cluster_ref", "Reference to a Cluster object providing clusterName."),
        Attribute::string("configuration_values")
            .optional()
            .description("The set of configuration values for the add-on, as a JSON string."),
        Attribute::object_list(
            "pod_identity_associations",
            vec![
                Attribute::string("role_arn").required().json_name("roleARN"),
                Attribute::string("service_account").required(),
            ],
        )
        .optional()
        .description("EKS Pod Identity associations owned by the add-on."),
        Attribute::string("resolve_conflicts")
            .optional()
            .description("How to resolve field value conflicts for an add-on.")
            .validator(Validator::one_of(&["NONE", "OVERWRITE", "PRESERVE"])),
        Attribute::string("service_account_role_arn")
            .optional()
            .json_name("serviceAccountRoleARN")
            .description("The ARN of an existing IAM role to bind to the add-on's service account."),
        reference(
            "service_account_role_ref",
            "Reference to a Role object providing serviceAccountRoleARN.",
        ),
        tags(),
    ]
}

fn cluster_spec() -> Vec<Attribute> {
    vec![
        Attribute::string("name")
            .required()
            .description("The unique name to give to your cluster.")
            .validator(Validator::length_at_least(1))
            .validator(Validator::length_at_most(100))
            .validator(Validator::regex(
                r"^[0-9A-Za-z][A-Za-z0-9\-_]*$",
                "must start with an alphanumeric character and contain only alphanumerics, hyphens and underscores",
            )),
        Attribute::object(
            "access_config",
            vec![
                Attribute::string("authentication_mode")
                    .optional()
                    .validator(Validator::one_of(&["API", "API_AND_CONFIG_MAP", "CONFIG_MAP"])),
                Attribute::bool("bootstrap_cluster_creator_admin_permissions").optional(),
            ],
        )
        .optional()
        .description("The access configuration for the cluster."),
        Attribute::string("client_request_token")
            .optional()
            .description("A unique, case-sensitive identifier that you provide to ensure idempotency."),
        Attribute::object_list(
            "encryption_config",
            vec![
                Attribute::object(
                    "provider",
                    vec![
                        Attribute::string("key_arn").optional().json_name("keyARN"),
                        reference("key_ref", "Reference to a KMS Key object providing keyARN."),
                    ],
                )
                .optional(),
                Attribute::string_list("resources").optional(),
            ],
        )
        .optional()
        .validator(Validator::size_at_most(1))
        .description("The encryption configuration for the cluster."),
        Attribute::object(
            "kubernetes_network_config",
            vec![
                Attribute::string("ip_family")
                    .optional()
                    .validator(Validator::one_of(&["ipv4", "ipv6"])),
                Attribute::string("service_ipv4_cidr")
                    .optional()
                    .json_name("serviceIPv4CIDR"),
            ],
        )
        .optional()
        .description("The Kubernetes network configuration for the cluster."),
        Attribute::object(
            "logging",
            vec![Attribute::object_list(
                "cluster_logging",
                vec![
                    Attribute::bool("enabled").optional(),
                    Attribute::string_list("types").optional(),
                ],
            )
            .optional()],
        )
        .optional()
        .description("Enable or disable exporting the control plane logs for the cluster."),
        Attribute::object(
            "resources_vpc_config",
            vec![
                Attribute::bool("endpoint_private_access").optional(),
                Attribute::bool("endpoint_public_access").optional(),
                Attribute::string_list("public_access_cidrs")
                    .optional()
                    .json_name("publicAccessCIDRs"),
                Attribute::string_list("security_group_ids")
                    .optional()
                    .json_name("securityGroupIDs"),
                reference_list("security_group_refs", "References to SecurityGroup objects."),
                Attribute::string_list("subnet_ids")
                    .optional()
                    .json_name("subnetIDs"),
                reference_list("subnet_refs", "References to Subnet objects."),
            ],
        )
        .required()
        .json_name("resourcesVPCConfig")
        .description("The VPC configuration that's used by the cluster control plane."),
        Attribute::string("role_arn")
            .optional()
            .json_name("roleARN")
            .description("The ARN of the IAM role that provides permissions for the Kubernetes control plane."),
        reference("role_ref", "Reference to a Role object providing roleARN."),
        tags(),
        Attribute::string("version")
            .optional()
            .description("The desired Kubernetes version for your cluster."),
    ]
}

fn nodegroup_spec() -> Vec<Attribute> {
    vec![
        Attribute::string("name")
            .required()
            .description("The unique name to give your node group."),
        Attribute::string("ami_type")
            .optional()
            .description("The AMI type for your node group.")
            .validator(Validator::one_of(&[
                "AL2_x86_64",
                "AL2_x86_64_GPU",
                "AL2_ARM_64",
                "CUSTOM",
                "BOTTLEROCKET_ARM_64",
                "BOTTLEROCKET_x86_64",
                "AL2023_x86_64_STANDARD",
                "AL2023_ARM_64_STANDARD",
            ])),
        Attribute::string("capacity_type")
            .optional()
            .description("The capacity type for your node group.")
            .validator(Validator::one_of(&["ON_DEMAND", "SPOT", "CAPACITY_BLOCK"])),
        Attribute::string("client_request_token").optional(),
        Attribute::string("cluster_name")
            .optional()
            .description("The name of your cluster."),
        reference("cluster_ref", "Reference to a Cluster object providing clusterName."),
        Attribute::int64("disk_size")
            .optional()
            .description("The root device disk size (in GiB) for your node group instances.")
            .validator(Validator::at_least(1)),
        Attribute::string_list("instance_types")
            .optional()
            .description("Specify the instance types for a node group."),
        Attribute::string_map("labels")
            .optional()
            .description("The Kubernetes labels to apply to the nodes in the node group when they are created."),
        Attribute::object(
            "launch_template",
            vec![
                Attribute::string("id").optional(),
                Attribute::string("name").optional(),
                Attribute::string("version").optional(),
            ],
        )
        .optional()
        .description("An object representing a node group's launch template specification."),
        Attribute::string("node_role")
            .optional()
            .description("The ARN of the IAM role to associate with your node group."),
        reference("node_role_ref", "Reference to a Role object providing nodeRole."),
        Attribute::string("release_version")
            .optional()
            .description("The AMI version of the Amazon EKS optimized AMI to use with your node group."),
        Attribute::object(
            "remote_access",
            vec![
                Attribute::string("ec2_ssh_key").optional(),
                Attribute::string_list("source_security_groups").optional(),
            ],
        )
        .optional()
        .description("The remote access configuration to use with your node group."),
        Attribute::object(
            "scaling_config",
            vec![
                Attribute::int64("desired_size").optional().validator(Validator::at_least(0)),
                Attribute::int64("max_size").optional().validator(Validator::at_least(1)),
                Attribute::int64("min_size").optional().validator(Validator::at_least(0)),
            ],
        )
        .optional()
        .description("The scaling configuration details for the Auto Scaling group that is created for your node group."),
        Attribute::string_list("subnets")
            .optional()
            .description("The subnets to use for the Auto Scaling group that is created for your node group."),
        reference_list("subnet_refs", "References to Subnet objects providing subnets."),
        tags(),
        Attribute::object_list(
            "taints",
            vec![
                Attribute::string("effect")
                    .optional()
                    .validator(Validator::one_of(&["NO_SCHEDULE", "NO_EXECUTE", "PREFER_NO_SCHEDULE"])),
                Attribute::string("key").optional(),
                Attribute::string("value").optional(),
            ],
        )
        .optional()
        .description("The Kubernetes taints to be applied to the nodes in the node group."),
        Attribute::object(
            "update_config",
            vec![
                Attribute::int64("max_unavailable").optional().validator(Validator::at_least(1)),
                Attribute::int64("max_unavailable_percentage")
                    .optional()
                    .validator(Validator::at_least(1))
                    .validator(Validator::at_most(100)),
            ],
        )
        .optional()
        .description("The node group update configuration."),
        Attribute::string("version")
            .optional()
            .description("The Kubernetes version to use for your managed nodes."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_config;
    use serde_json::json;

    #[test]
    fn test_irregular_field_names() {
        let schema = CLUSTER.resource_schema();
        let vpc = schema.attribute_at("spec.resources_vpc_config").unwrap();
        assert_eq!(vpc.json_name, "resourcesVPCConfig");
        assert_eq!(
            schema
                .attribute_at("spec.resources_vpc_config.public_access_cidrs")
                .unwrap()
                .json_name,
            "publicAccessCIDRs"
        );
        assert_eq!(
            ADDON
                .resource_schema()
                .attribute_at("spec.service_account_role_arn")
                .unwrap()
                .json_name,
            "serviceAccountRoleARN"
        );
    }

    #[test]
    fn test_cluster_object_uses_crd_field_names() {
        let schema = CLUSTER.resource_schema();
        let state = json!({
            "metadata": {"name": "prod", "namespace": "infra"},
            "spec": {
                "name": "prod",
                "role_arn": "arn:aws:iam::123456789012:role/eks",
                "resources_vpc_config": {
                    "subnet_refs": [{"from": {"name": "private-a"}}],
                    "endpoint_public_access": false
                },
                "kubernetes_network_config": {"service_ipv4_cidr": "172.20.0.0/16"}
            }
        });

        let object = CLUSTER.build_object(&schema, &state).unwrap();
        assert_eq!(object["apiVersion"], "services.k8s.aws/v1alpha1");
        assert_eq!(object["spec"]["roleARN"], "arn:aws:iam::123456789012:role/eks");
        assert_eq!(
            object["spec"]["resourcesVPCConfig"]["subnetRefs"][0]["from"]["name"],
            "private-a"
        );
        assert_eq!(
            object["spec"]["kubernetesNetworkConfig"]["serviceIPv4CIDR"],
            "172.20.0.0/16"
        );
    }

    #[test]
    fn test_nodegroup_validators() {
        let schema = NODEGROUP.resource_schema();
        let config = json!({
            "metadata": {"name": "workers", "namespace": "infra"},
            "spec": {
                "name": "workers",
                "capacity_type": "RESERVED",
                "scaling_config": {"min_size": 0, "max_size": 0},
                "taints": [{"effect": "NoSchedule", "key": "gpu"}]
            }
        });

        let diags = validate_config(&schema, &config);
        let paths: Vec<_> = diags.iter().filter_map(|d| d.path.as_deref()).collect();
        assert_eq!(
            paths,
            vec![
                "spec.capacity_type",
                "spec.scaling_config.max_size",
                "spec.taints[0].effect",
            ]
        );
    }
}
