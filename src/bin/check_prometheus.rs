use color_eyre::eyre::{eyre, Report, WrapErr};
use wtf_nagios_plugin::{
    config_file, CheckContext, Config, ElementCheck, Outcome, Plugin, PluginConfig, Runnable,
    Status,
};

fn get_config_file_arg() -> Option<String> {
    let mut args = std::env::args().take(3).skip(1);
    let flag = args.next()?;
    if flag != "-c" {
        return None;
    }
    args.next()
}

fn load_config() -> Result<Config, Report> {
    let cfg_file =
        get_config_file_arg().ok_or_else(|| eyre!("Usage: check_prometheus -c <config_file.toml>"))?;
    let cfg = wtf_nagios_plugin::parse_config(&cfg_file)?;
    if cfg.elements.is_empty() {
        return Err(eyre!("no elements configured in {}", cfg_file));
    }
    Ok(cfg)
}

/// Scrapes every configured element and holds its metrics to their thresholds.
struct CheckPrometheus {
    elements: Vec<config_file::Element>,
}

impl Runnable for CheckPrometheus {
    fn run(&mut self, check: &mut CheckContext, config: &PluginConfig) -> Result<(), Report> {
        let elements = self
            .elements
            .drain(..)
            .map(|e| ElementCheck::from_config(e, config))
            .collect::<Result<Vec<_>, _>>()?;

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("building tokio runtime")?;
        let readings = rt.block_on(async {
            let mut readings = Vec::new();
            for el in &elements {
                let r = el
                    .check(check.status_mut())
                    .await
                    .wrap_err_with(|| format!("checking {}", el.url()))?;
                readings.extend(r);
            }
            Ok::<_, Report>(readings)
        })?;

        let breaches: Vec<String> = readings
            .iter()
            .filter(|r| r.status != Status::Ok)
            .map(|r| format!("{} = {} ({})", r.label, r.value, r.thresholds.describe()))
            .collect();
        if breaches.is_empty() {
            check.status_mut().set_ok();
            check.set_message(format!("{} metrics within thresholds", readings.len()));
        } else {
            check.set_message(breaches.join(", "));
        }
        for r in readings {
            check.push_perfdata(r.perfdata);
        }
        Ok(())
    }
}

fn main() -> Result<(), Report> {
    color_eyre::install()?;
    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => Outcome::unknown(format!("{:#}", e)).print_and_exit(),
    };
    Plugin::new(cfg.plugin)
        .main(&mut CheckPrometheus {
            elements: cfg.elements,
        })
        .print_and_exit()
}
