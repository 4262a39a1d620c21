//! Command specs for the UPF power-intent dialect.

use indexmap::IndexMap;

use crate::commands::spec::{ArgSpec, PositionalSpec, PositionalValue, SwitchSpec, SwitchValue};
use crate::commands::CommandEntry;

fn flag() -> SwitchSpec {
    SwitchSpec { required: false, repeated: false, value: SwitchValue::None, metavar: None }
}

fn value(metavar: &str) -> SwitchSpec {
    SwitchSpec {
        required: false,
        repeated: false,
        value: SwitchValue::Any,
        metavar: Some(metavar.to_string()),
    }
}

fn required_value(metavar: &str) -> SwitchSpec {
    SwitchSpec {
        required: true,
        repeated: false,
        value: SwitchValue::Any,
        metavar: Some(metavar.to_string()),
    }
}

fn repeated_value(metavar: &str) -> SwitchSpec {
    SwitchSpec {
        required: false,
        repeated: true,
        value: SwitchValue::Any,
        metavar: Some(metavar.to_string()),
    }
}

fn positional(name: &str, required: bool) -> PositionalSpec {
    PositionalSpec { name: name.to_string(), required, value: PositionalValue::Any }
}

fn spec(switches: Vec<(&str, SwitchSpec)>, positionals: Vec<PositionalSpec>) -> CommandEntry {
    CommandEntry::Spec(ArgSpec {
        switches: switches.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        positionals,
    })
}

pub fn commands() -> IndexMap<String, CommandEntry> {
    let entries: Vec<(&str, CommandEntry)> = vec![
        ("upf_version", spec(vec![], vec![positional("version", false)])),
        (
            "load_upf",
            spec(
                vec![("-scope", value("instance"))],
                vec![positional("upf_file", true)],
            ),
        ),
        (
            "create_power_domain",
            spec(
                vec![
                    ("-include_scope", flag()),
                    ("-scope", value("instance")),
                    ("-elements", value("element_list")),
                    ("-supply", repeated_value("supply_set")),
                ],
                vec![positional("domain_name", true)],
            ),
        ),
        (
            "create_supply_net",
            spec(
                vec![
                    ("-domain", value("domain_name")),
                    ("-reuse", flag()),
                    ("-resolve", value("resolution_type")),
                ],
                vec![positional("net_name", true)],
            ),
        ),
        (
            "create_supply_port",
            spec(
                vec![
                    ("-domain", value("domain_name")),
                    ("-direction", value("direction")),
                ],
                vec![positional("port_name", true)],
            ),
        ),
        (
            "connect_supply_net",
            spec(
                vec![
                    ("-ports", value("port_list")),
                    ("-pins", value("pin_list")),
                ],
                vec![positional("net_name", true)],
            ),
        ),
        (
            "set_domain_supply_net",
            spec(
                vec![
                    ("-primary_power_net", required_value("net_name")),
                    ("-primary_ground_net", required_value("net_name")),
                ],
                vec![positional("domain_name", true)],
            ),
        ),
        (
            "create_pst",
            spec(
                vec![("-supplies", required_value("supply_list"))],
                vec![positional("table_name", true)],
            ),
        ),
        (
            "add_pst_state",
            spec(
                vec![
                    ("-pst", required_value("table_name")),
                    ("-state", required_value("state_list")),
                ],
                vec![positional("state_name", true)],
            ),
        ),
        (
            "set_isolation",
            spec(
                vec![
                    ("-domain", required_value("domain_name")),
                    ("-isolation_power_net", value("net_name")),
                    ("-isolation_ground_net", value("net_name")),
                    ("-clamp_value", value("value")),
                    ("-elements", value("element_list")),
                    ("-applies_to", value("kind")),
                    ("-no_isolation", flag()),
                ],
                vec![positional("isolation_name", true)],
            ),
        ),
        (
            "set_isolation_control",
            spec(
                vec![
                    ("-domain", required_value("domain_name")),
                    ("-isolation_signal", required_value("signal")),
                    ("-isolation_sense", value("sense")),
                    ("-location", value("location")),
                ],
                vec![positional("isolation_name", true)],
            ),
        ),
        (
            "set_retention",
            spec(
                vec![
                    ("-domain", required_value("domain_name")),
                    ("-retention_power_net", value("net_name")),
                    ("-retention_ground_net", value("net_name")),
                    ("-elements", value("element_list")),
                ],
                vec![positional("retention_name", true)],
            ),
        ),
        (
            "set_level_shifter",
            spec(
                vec![
                    ("-domain", required_value("domain_name")),
                    ("-applies_to", value("kind")),
                    ("-threshold", value("value")),
                    ("-rule", value("rule")),
                    ("-location", value("location")),
                ],
                vec![positional("name", true)],
            ),
        ),
    ];

    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
