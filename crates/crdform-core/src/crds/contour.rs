//! `projectcontour.io/v1` kinds

use crate::definition::CrdDefinition;
use crate::schema::{Attribute, Validator};

const GROUP: &str = "projectcontour.io";
const VERSION: &str = "v1";

pub const HTTP_PROXY: CrdDefinition = CrdDefinition {
    group: GROUP,
    version: VERSION,
    kind: "HTTPProxy",
    plural: "httpproxies",
    description: "HTTPProxySpec defines the spec of the CRD.",
    spec: http_proxy_spec,
};

pub const TLS_CERTIFICATE_DELEGATION: CrdDefinition = CrdDefinition {
    group: GROUP,
    version: VERSION,
    kind: "TLSCertificateDelegation",
    plural: "tlscertificatedelegations",
    description: "TLSCertificateDelegationSpec defines the spec of the CRD.",
    spec: tls_certificate_delegation_spec,
};

fn port() -> Attribute {
    Attribute::int64("port")
        .required()
        .description("Port (defined as Integer) to proxy traffic to since a service can have multiple defined.")
        .validator(Validator::at_least(1))
        .validator(Validator::at_most(65535))
}

fn header_match_condition() -> Attribute {
    Attribute::object(
        "header",
        vec![
            Attribute::string("name").required(),
            Attribute::string("contains").optional(),
            Attribute::string("exact").optional(),
            Attribute::bool("ignore_case").optional(),
            Attribute::string("notcontains").optional(),
            Attribute::string("notexact").optional(),
            Attribute::bool("notpresent").optional(),
            Attribute::bool("present").optional(),
            Attribute::string("regex").optional(),
        ],
    )
    .optional()
    .description("Header specifies the header condition to match.")
}

fn match_conditions() -> Attribute {
    Attribute::object_list(
        "conditions",
        vec![
            Attribute::string("exact").optional(),
            header_match_condition(),
            Attribute::string("prefix").optional(),
            Attribute::object(
                "query_parameter",
                vec![
                    Attribute::string("name").required(),
                    Attribute::string("contains").optional(),
                    Attribute::string("exact").optional(),
                    Attribute::bool("ignore_case").optional(),
                    Attribute::bool("present").optional(),
                    Attribute::string("prefix").optional(),
                    Attribute::string("regex").optional(),
                    Attribute::string("suffix").optional(),
                ],
            )
            .optional(),
            Attribute::string("regex").optional(),
        ],
    )
    .optional()
    .description("Conditions are a set of rules that are applied to a Route.")
}

fn headers_policy(name: &str) -> Attribute {
    Attribute::object(
        name,
        vec![
            Attribute::string_list("remove").optional(),
            Attribute::object_list(
                "set",
                vec![
                    Attribute::string("name").required().validator(Validator::length_at_least(1)),
                    Attribute::string("value").required().validator(Validator::length_at_least(1)),
                ],
            )
            .optional(),
        ],
    )
    .optional()
}

fn service() -> Vec<Attribute> {
    vec![
        Attribute::string("name")
            .required()
            .description("Name is the name of Kubernetes service to proxy traffic.")
            .validator(Validator::length_at_least(1)),
        port(),
        Attribute::string("protocol")
            .optional()
            .description("Protocol may be used to specify (or override) the protocol used to reach this Service.")
            .validator(Validator::one_of(&["h2", "h2c", "tls"])),
        headers_policy("request_headers_policy"),
        headers_policy("response_headers_policy"),
        Attribute::bool("mirror").optional(),
        Attribute::int64("weight")
            .optional()
            .description("Weight defines percentage of traffic to balance traffic.")
            .validator(Validator::at_least(0)),
    ]
}

fn http_proxy_spec() -> Vec<Attribute> {
    vec![
        Attribute::object_list(
            "includes",
            vec![
                match_conditions(),
                Attribute::string("name")
                    .required()
                    .description("Name of the HTTPProxy"),
                Attribute::string("namespace")
                    .optional()
                    .description("Namespace of the HTTPProxy to include. Defaults to the current namespace if not supplied."),
            ],
        )
        .optional()
        .description("Includes allow for specific routing configuration to be included from another HTTPProxy, possibly in another namespace."),
        Attribute::string("ingress_class_name")
            .optional()
            .description("IngressClassName optionally specifies the ingress class to use for this HTTPProxy."),
        Attribute::object_list(
            "routes",
            vec![
                match_conditions(),
                Attribute::bool("enable_websockets").optional(),
                Attribute::object(
                    "path_rewrite_policy",
                    vec![Attribute::object_list(
                        "replace_prefix",
                        vec![
                            Attribute::string("prefix").optional(),
                            Attribute::string("replacement")
                                .required()
                                .validator(Validator::length_at_least(1)),
                        ],
                    )
                    .optional()],
                )
                .optional(),
                Attribute::bool("permit_insecure").optional(),
                headers_policy("request_headers_policy"),
                headers_policy("response_headers_policy"),
                Attribute::object(
                    "retry_policy",
                    vec![
                        Attribute::int64("count").optional().validator(Validator::at_least(0)),
                        Attribute::string("per_try_timeout")
                            .optional()
                            .validator(Validator::regex(
                                r"^(((\d*(\.\d*)?h)|(\d*(\.\d*)?m)|(\d*(\.\d*)?s)|(\d*(\.\d*)?ms)|(\d*(\.\d*)?us)|(\d*(\.\d*)?µs)|(\d*(\.\d*)?ns))+)$",
                                "must be a duration such as 10s or 1m30s",
                            )),
                        Attribute::string_list("retry_on").optional(),
                    ],
                )
                .optional(),
                Attribute::object_list("services", service())
                    .optional()
                    .description("Services are the services to proxy traffic."),
                Attribute::object(
                    "timeout_policy",
                    vec![
                        Attribute::string("idle").optional(),
                        Attribute::string("idle_connection").optional(),
                        Attribute::string("response").optional(),
                    ],
                )
                .optional(),
            ],
        )
        .optional()
        .description("Routes are the ingress routes. If TCPProxy is present, Routes is ignored."),
        Attribute::object(
            "tcpproxy",
            vec![
                Attribute::object(
                    "include",
                    vec![
                        Attribute::string("name").required(),
                        Attribute::string("namespace").optional(),
                    ],
                )
                .optional(),
                Attribute::object_list(
                    "services",
                    vec![
                        Attribute::string("name").required(),
                        port(),
                        Attribute::string("protocol")
                            .optional()
                            .validator(Validator::one_of(&["h2", "h2c", "tls"])),
                        Attribute::int64("weight").optional(),
                    ],
                )
                .optional(),
            ],
        )
        .optional()
        .description("TCPProxy holds TCP proxy information."),
        Attribute::object(
            "virtualhost",
            vec![
                Attribute::object(
                    "cors_policy",
                    vec![
                        Attribute::bool("allow_credentials").optional(),
                        Attribute::string_list("allow_headers").optional(),
                        Attribute::string_list("allow_methods").required(),
                        Attribute::string_list("allow_origin").required(),
                        Attribute::bool("allow_private_network").optional(),
                        Attribute::string_list("expose_headers").optional(),
                        Attribute::string("max_age").optional(),
                    ],
                )
                .optional(),
                Attribute::string("fqdn")
                    .required()
                    .description("The fully qualified domain name of the root of the ingress tree.")
                    .validator(Validator::length_at_least(1)),
                Attribute::object(
                    "tls",
                    vec![
                        Attribute::object(
                            "client_validation",
                            vec![
                                Attribute::string("ca_secret").optional(),
                                Attribute::bool("skip_client_cert_validation").optional(),
                                Attribute::bool("optional_client_certificate").optional(),
                            ],
                        )
                        .optional(),
                        Attribute::bool("enable_fallback_certificate").optional(),
                        Attribute::string("maximum_protocol_version").optional(),
                        Attribute::string("minimum_protocol_version")
                            .optional()
                            .validator(Validator::one_of(&["", "1.2", "1.3"])),
                        Attribute::bool("passthrough").optional(),
                        Attribute::string("secret_name").optional(),
                    ],
                )
                .optional()
                .description("If present the fields describes TLS properties of the virtual host."),
            ],
        )
        .optional()
        .description("Virtualhost appears at most once. If it is present, the object is considered to be a 'root' HTTPProxy."),
    ]
}

fn tls_certificate_delegation_spec() -> Vec<Attribute> {
    vec![Attribute::object_list(
        "delegations",
        vec![
            Attribute::string("secret_name").required(),
            Attribute::string_list("target_namespaces").required(),
        ],
    )
    .required()]
}
