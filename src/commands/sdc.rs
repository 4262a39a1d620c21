//! Command specs for the SDC timing-constraint dialect, plus the XDC
//! extensions layered on top of it.
//!
//! These are declarative grammars rather than handlers: SDC commands take
//! ordinary switch/positional arguments and never scripts.

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

fn variadic(name: &str, required: bool) -> PositionalSpec {
    PositionalSpec { name: name.to_string(), required, value: PositionalValue::Variadic }
}

fn spec(switches: Vec<(&str, SwitchSpec)>, positionals: Vec<PositionalSpec>) -> CommandEntry {
    CommandEntry::Spec(ArgSpec {
        switches: switches.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        positionals,
    })
}

/// Object-query commands (`get_ports`, `get_cells`, ...) share a grammar.
fn object_query(of_objects: bool) -> CommandEntry {
    let mut switches = vec![
        ("-filter", value("expression")),
        ("-regexp", flag()),
        ("-nocase", flag()),
        ("-quiet", flag()),
    ];
    if of_objects {
        switches.push(("-of_objects", value("objects")));
    }
    spec(switches, vec![variadic("patterns", false)])
}

pub fn commands() -> IndexMap<String, CommandEntry> {
    let entries: Vec<(&str, CommandEntry)> = vec![
        (
            "create_clock",
            spec(
                vec![
                    ("-period", required_value("period")),
                    ("-name", value("clock_name")),
                    ("-waveform", value("edge_list")),
                    ("-add", flag()),
                ],
                vec![variadic("source_objects", false)],
            ),
        ),
        (
            "create_generated_clock",
            spec(
                vec![
                    ("-source", required_value("master_pin")),
                    ("-name", value("clock_name")),
                    ("-divide_by", value("factor")),
                    ("-multiply_by", value("factor")),
                    ("-edges", value("edge_list")),
                    ("-duty_cycle", value("percent")),
                    ("-invert", flag()),
                    ("-add", flag()),
                    ("-master_clock", value("clock")),
                ],
                vec![variadic("source_objects", true)],
            ),
        ),
        (
            "set_clock_groups",
            spec(
                vec![
                    ("-group", repeated_value("clock_list")),
                    ("-name", value("name")),
                    ("-asynchronous", flag()),
                    ("-physically_exclusive", flag()),
                    ("-logically_exclusive", flag()),
                ],
                vec![],
            ),
        ),
        (
            "set_input_delay",
            spec(
                vec![
                    ("-clock", value("clock")),
                    ("-clock_fall", flag()),
                    ("-rise", flag()),
                    ("-fall", flag()),
                    ("-max", flag()),
                    ("-min", flag()),
                    ("-add_delay", flag()),
                    ("-network_latency_included", flag()),
                    ("-source_latency_included", flag()),
                ],
                vec![positional("delay_value", true), variadic("port_pin_list", true)],
            ),
        ),
        (
            "set_output_delay",
            spec(
                vec![
                    ("-clock", value("clock")),
                    ("-clock_fall", flag()),
                    ("-rise", flag()),
                    ("-fall", flag()),
                    ("-max", flag()),
                    ("-min", flag()),
                    ("-add_delay", flag()),
                    ("-network_latency_included", flag()),
                    ("-source_latency_included", flag()),
                ],
                vec![positional("delay_value", true), variadic("port_pin_list", true)],
            ),
        ),
        (
            "set_false_path",
            spec(
                vec![
                    ("-from", value("objects")),
                    ("-to", value("objects")),
                    ("-through", repeated_value("objects")),
                    ("-setup", flag()),
                    ("-hold", flag()),
                    ("-rise", flag()),
                    ("-fall", flag()),
                ],
                vec![],
            ),
        ),
        (
            "set_multicycle_path",
            spec(
                vec![
                    ("-from", value("objects")),
                    ("-to", value("objects")),
                    ("-through", repeated_value("objects")),
                    ("-setup", flag()),
                    ("-hold", flag()),
                    ("-rise", flag()),
                    ("-fall", flag()),
                    ("-start", flag()),
                    ("-end", flag()),
                ],
                vec![positional("path_multiplier", true)],
            ),
        ),
        (
            "set_max_delay",
            spec(
                vec![
                    ("-from", value("objects")),
                    ("-to", value("objects")),
                    ("-through", repeated_value("objects")),
                    ("-rise", flag()),
                    ("-fall", flag()),
                    ("-datapath_only", flag()),
                ],
                vec![positional("delay_value", true)],
            ),
        ),
        (
            "set_min_delay",
            spec(
                vec![
                    ("-from", value("objects")),
                    ("-to", value("objects")),
                    ("-through", repeated_value("objects")),
                    ("-rise", flag()),
                    ("-fall", flag()),
                ],
                vec![positional("delay_value", true)],
            ),
        ),
        (
            "set_load",
            spec(
                vec![
                    ("-pin_load", flag()),
                    ("-wire_load", flag()),
                    ("-max", flag()),
                    ("-min", flag()),
                ],
                vec![positional("value", true), variadic("objects", true)],
            ),
        ),
        (
            "set_driving_cell",
            spec(
                vec![
                    ("-lib_cell", value("cell_name")),
                    ("-library", value("library")),
                    ("-pin", value("pin_name")),
                    ("-from_pin", value("pin_name")),
                    ("-max", flag()),
                    ("-min", flag()),
                    ("-rise", flag()),
                    ("-fall", flag()),
                ],
                vec![variadic("port_list", true)],
            ),
        ),
        (
            "set_units",
            spec(
                vec![
                    ("-time", value("unit")),
                    ("-capacitance", value("unit")),
                    ("-current", value("unit")),
                    ("-voltage", value("unit")),
                    ("-resistance", value("unit")),
                    ("-power", value("unit")),
                ],
                vec![],
            ),
        ),
        ("get_ports", object_query(false)),
        ("get_pins", object_query(true)),
        ("get_cells", object_query(true)),
        ("get_nets", object_query(true)),
        ("get_clocks", object_query(false)),
        ("all_inputs", spec(vec![], vec![])),
        ("all_outputs", spec(vec![], vec![])),
        ("all_clocks", spec(vec![], vec![])),
        ("current_design", spec(vec![], vec![positional("design", false)])),
    ];

    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Commands XDC adds on top of the SDC set.
pub fn xdc_commands() -> IndexMap<String, CommandEntry> {
    let entries: Vec<(&str, CommandEntry)> = vec![
        (
            "set_property",
            spec(
                vec![
                    ("-dict", value("key_value_list")),
                    ("-quiet", flag()),
                    ("-verbose", flag()),
                ],
                vec![
                    positional("name", true),
                    positional("value", true),
                    variadic("objects", true),
                ],
            ),
        ),
        (
            "get_property",
            spec(
                vec![
                    ("-min", flag()),
                    ("-max", flag()),
                    ("-quiet", flag()),
                    ("-verbose", flag()),
                ],
                vec![positional("name", true), positional("object", true)],
            ),
        ),
        (
            "create_pblock",
            spec(
                vec![("-quiet", flag()), ("-verbose", flag())],
                vec![positional("name", true)],
            ),
        ),
        (
            "add_cells_to_pblock",
            spec(
                vec![
                    ("-top", flag()),
                    ("-add_primitives", flag()),
                    ("-clear_locs", flag()),
                    ("-quiet", flag()),
                    ("-verbose", flag()),
                ],
                vec![positional("pblock", true), variadic("cells", false)],
            ),
        ),
        (
            "resize_pblock",
            spec(
                vec![
                    ("-add", value("sites")),
                    ("-remove", value("sites")),
                    ("-locs", value("mode")),
                    ("-replace", flag()),
                    ("-quiet", flag()),
                    ("-verbose", flag()),
                ],
                vec![positional("pblock", true)],
            ),
        ),
    ];

    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
