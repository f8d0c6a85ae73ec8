use color_eyre::eyre::Report;
use wtf_nagios_plugin::{Plugin, ValueArgs};

fn main() -> Result<(), Report> {
    color_eyre::install()?;
    let mut args = match ValueArgs::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(usage) => usage.print_and_exit(),
    };
    Plugin::new(args.plugin_config())
        .main(&mut args)
        .print_and_exit()
}
