use std::env;
use std::process;

use drivepath::{ClientConfig, CompatClient, DriveClient};

pub fn usage_and_exit(usage: &str) -> ! {
    eprintln!("{usage}");
    process::exit(1);
}

pub struct ArgParser {
    args: Vec<String>,
    usage: &'static str,
}

impl ArgParser {
    pub fn new(usage: &'static str) -> Self {
        let args: Vec<String> = env::args().skip(1).collect();

        if args.iter().any(|a| a == "--help" || a == "-h") {
            println!("{usage}");
            process::exit(0);
        }

        Self { args, usage }
    }

    pub fn take_value(&mut self, names: &[&str]) -> Option<String> {
        let mut i = 0;
        while i < self.args.len() {
            if names.contains(&self.args[i].as_str()) {
                let value = self.args.get(i + 1).cloned();
                if value.is_none() {
                    usage_and_exit(self.usage);
                }
                self.args.drain(i..=i + 1);
                return value;
            }
            i += 1;
        }
        None
    }

    #[allow(dead_code)]
    pub fn take_flag(&mut self, names: &[&str]) -> bool {
        match self.args.iter().position(|a| names.contains(&a.as_str())) {
            Some(i) => {
                self.args.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn remaining(self) -> Vec<String> {
        self.args
    }
}

/// Connection options shared by every demo.
pub struct Options {
    pub config: ClientConfig,
    pub positionals: Vec<String>,
}

pub fn parse_options(usage: &'static str) -> Options {
    let mut parser = ArgParser::new(usage);
    let config = config_from_parser(&mut parser);
    Options {
        config,
        positionals: parser.remaining(),
    }
}

/// `--credentials` and `--working-dir` override `DRIVEPATH_CREDENTIALS`
/// and `DRIVEPATH_WORKING_DIR`.
pub fn config_from_parser(parser: &mut ArgParser) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(path) = parser.take_value(&["--credentials", "-c"]) {
        config.credential_path = Some(path.into());
    }
    if let Some(dir) = parser.take_value(&["--working-dir", "-w"]) {
        config = config.with_working_dir(dir);
    }
    if let Some(proxy) = parser.take_value(&["--proxy"]) {
        config = config.with_proxy(proxy);
    }
    config
}

impl Options {
    #[allow(dead_code)] // Some demos only use the compat surface.
    pub fn client(&self) -> drivepath::Result<DriveClient> {
        DriveClient::from_config(self.config.clone())
    }

    #[allow(dead_code)]
    pub fn compat_client(&self) -> drivepath::Result<CompatClient> {
        CompatClient::from_config(self.config.clone())
    }
}
