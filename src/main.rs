//! Reclass Classifier CLI
//!
//! Command line front end over a reclass inventory: node and cluster
//! metadata CRUD, and rule-based node classification.
//!
//! ```text
//! reclass-classifier --inventory /srv/salt/reclass node list
//! reclass-classifier cluster set --cluster lab ntp_server 10.0.0.1
//! reclass-classifier classify web01.lab.local --attrs grains.yml --rules mapping.yml
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reclass_classifier::{
    parse_rule_table, Classifier, ClassifierConfig, ClusterTarget, Error, MemoryStore,
    MetadataStore, NodeAttributes, NodeSpec, Params, Result, StoreConfig, YamlStore,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Reclass Classifier - node metadata and rule-based classification
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Inventory base directory (holds nodes/ and classes/)
    #[arg(long, env = "RECLASS_INVENTORY", global = true)]
    inventory: Option<PathBuf>,

    /// Reclass config file providing inventory_base_uri
    #[arg(long, env = "RECLASS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, env = "RECLASS_OUTPUT", default_value = "yaml", global = true)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Node documents
    Node {
        #[command(subcommand)]
        action: NodeCommand,
    },
    /// Cluster-level parameters
    Cluster {
        #[command(subcommand)]
        action: ClusterCommand,
    },
    /// Classify a node against a rule table
    Classify(ClassifyArgs),
}

#[derive(Subcommand, Debug)]
enum NodeCommand {
    /// List all nodes
    List,
    /// Show one node
    Get { name: String },
    /// Create a node (no-op if it exists)
    Create {
        name: String,
        /// Sub-directory under nodes/
        #[arg(long)]
        path: Option<String>,
        #[arg(long, default_value = reclass_classifier::domain::DEFAULT_CLUSTER)]
        cluster: String,
        #[arg(long, default_value = reclass_classifier::domain::DEFAULT_ENVIRONMENT)]
        environment: String,
        /// Class to assign (repeatable)
        #[arg(long = "class")]
        classes: Vec<String>,
        /// Parameter as key=value, value parsed as YAML (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Replace the classes and/or parameters of a node
    Update {
        name: String,
        #[arg(long = "class")]
        classes: Vec<String>,
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, Value)>,
    },
    /// Delete a node
    Delete { name: String },
}

#[derive(ClapArgs, Debug, Clone)]
struct TargetArgs {
    /// Cluster directory under classes/cluster
    #[arg(long, default_value = "")]
    cluster: String,

    /// File inside the cluster directory
    #[arg(long, default_value = reclass_classifier::domain::DEFAULT_CLUSTER_FILE)]
    file: String,
}

impl TargetArgs {
    fn target(&self) -> ClusterTarget {
        ClusterTarget::new(self.cluster.clone(), self.file.clone())
    }
}

#[derive(Subcommand, Debug)]
enum ClusterCommand {
    /// List all parameters of a cluster file
    List {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Show one parameter
    Get {
        name: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Set a parameter, value parsed as YAML
    Set {
        name: String,
        value: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Delete a parameter
    Delete {
        name: String,
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct ClassifyArgs {
    /// Node FQDN
    node: String,

    /// YAML/JSON file with the node attributes
    #[arg(long)]
    attrs: PathBuf,

    /// YAML file with the rule table
    #[arg(long)]
    rules: PathBuf,

    /// Evaluate only, write nothing
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    target: TargetArgs,
}

// =============================================================================
// Main
// =============================================================================

fn main() {
    let args = Args::parse();

    init_logging(&args);
    debug!(version = reclass_classifier::VERSION, "Starting reclass classifier");

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let output = args.output;

    if let Command::Classify(classify) = &args.command {
        if classify.dry_run {
            return run_classify(&MemoryStore::new(), classify, output);
        }
    }

    let store = YamlStore::new(store_config(&args)?);
    info!(inventory = %store.config().inventory_base_uri.display(), "Using inventory");

    match &args.command {
        Command::Node { action } => run_node(&store, action, output),
        Command::Cluster { action } => run_cluster(&store, action, output),
        Command::Classify(classify) => run_classify(&store, classify, output),
    }
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    match (&args.inventory, &args.config) {
        (Some(inventory), _) => Ok(StoreConfig::new(inventory)),
        (None, Some(config)) => StoreConfig::from_file(config),
        (None, None) => Err(Error::Configuration(
            "no inventory: pass --inventory or --config".into(),
        )),
    }
}

// =============================================================================
// Commands
// =============================================================================

fn run_node(store: &YamlStore, action: &NodeCommand, output: OutputFormat) -> Result<i32> {
    match action {
        NodeCommand::List => print(&store.list_nodes()?, output)?,
        NodeCommand::Get { name } => print(&store.get_node(name)?, output)?,
        NodeCommand::Create {
            name,
            path,
            cluster,
            environment,
            classes,
            params,
        } => {
            let mut spec = NodeSpec::new(name.clone())
                .with_cluster(cluster.clone())
                .with_environment(environment.clone())
                .with_classes(classes.clone())
                .with_parameters(to_params(params));
            spec.path = path.clone();
            print(&store.create_node(&spec)?, output)?;
        }
        NodeCommand::Update {
            name,
            classes,
            params,
        } => {
            let classes = (!classes.is_empty()).then(|| classes.clone());
            let params = (!params.is_empty()).then(|| to_params(params));
            if classes.is_none() && params.is_none() {
                return Err(Error::InvalidRequest(
                    "nothing to update: pass --class and/or --param".into(),
                ));
            }
            print(&store.update_node(name, classes, params)?, output)?;
        }
        NodeCommand::Delete { name } => {
            store.delete_node(name)?;
            print(&serde_json::json!({ "deleted": name }), output)?;
        }
    }
    Ok(0)
}

fn run_cluster(store: &YamlStore, action: &ClusterCommand, output: OutputFormat) -> Result<i32> {
    match action {
        ClusterCommand::List { target } => {
            print(&store.list_cluster_params(&target.target())?, output)?;
        }
        ClusterCommand::Get { name, target } => {
            let value = store
                .get_cluster_param(name, &target.target())?
                .ok_or_else(|| Error::not_found("cluster parameter", name.clone()))?;
            print(&value, output)?;
        }
        ClusterCommand::Set {
            name,
            value,
            target,
        } => {
            let value: Value = serde_yaml::from_str(value)?;
            print(&store.set_cluster_param(name, value, &target.target())?, output)?;
        }
        ClusterCommand::Delete { name, target } => {
            print(&store.delete_cluster_param(name, &target.target())?, output)?
        }
    }
    Ok(0)
}

fn run_classify<S: MetadataStore + ?Sized>(
    store: &S,
    args: &ClassifyArgs,
    output: OutputFormat,
) -> Result<i32> {
    let attrs = NodeAttributes::from_yaml(&read_yaml(&args.attrs)?);
    let rules = parse_rule_table(&read_text(&args.rules)?)?;
    debug!(attributes = attrs.len(), rules = rules.len(), "Loaded classification input");

    let config = ClassifierConfig {
        cluster_target: args.target.target(),
        ..Default::default()
    };
    let classifier = Classifier::with_config(store, config);

    if args.dry_run {
        print(&classifier.evaluate(&attrs, &rules), output)?;
        return Ok(0);
    }

    let result = classifier.classify(&args.node, &attrs, &rules);
    print(&result, output)?;
    Ok(if result.has_failures() { 1 } else { 0 })
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_param(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    let value = serde_yaml::from_str(value).map_err(|e| e.to_string())?;
    Ok((key.to_string(), value))
}

fn to_params(pairs: &[(String, Value)]) -> Params {
    pairs.iter().cloned().collect()
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::StoreIo {
        path: path.to_path_buf(),
        source,
    })
}

fn read_yaml(path: &Path) -> Result<Value> {
    serde_yaml::from_str(&read_text(path)?).map_err(|source| Error::StoreFormat {
        path: path.to_path_buf(),
        source,
    })
}

fn print<T: Serialize + ?Sized>(value: &T, output: OutputFormat) -> Result<()> {
    let text = match output {
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
        OutputFormat::Json => serde_json::to_string_pretty(value)? + "\n",
    };
    print!("{}", text);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse_param("port=8080").unwrap(),
            ("port".to_string(), Value::from(8080))
        );
        assert_eq!(
            parse_param("name=web=01").unwrap(),
            ("name".to_string(), Value::from("web=01"))
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=x").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let args = Args::try_parse_from([
            "reclass-classifier",
            "--inventory",
            "/srv/reclass",
            "classify",
            "web01.example.com",
            "--attrs",
            "grains.yml",
            "--rules",
            "mapping.yml",
            "--cluster",
            "lab",
            "--dry-run",
        ])
        .unwrap();

        match args.command {
            Command::Classify(classify) => {
                assert!(classify.dry_run);
                assert_eq!(classify.target.target(), ClusterTarget::overrides("lab"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_store_config_requires_inventory() {
        let args = Args {
            inventory: None,
            config: None,
            output: OutputFormat::Yaml,
            log_level: "warn".into(),
            log_json: false,
            command: Command::Node {
                action: NodeCommand::List,
            },
        };
        assert!(matches!(store_config(&args), Err(Error::Configuration(_))));
    }
}
