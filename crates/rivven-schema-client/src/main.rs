//! Rivven Schema Client
//!
//! Runs the reference catalog emulator or talks to a registry from the
//! command line.
//!
//! ## Usage
//!
//! ```bash
//! # Start the emulator
//! rivven-schema-client serve --port 8081
//!
//! # Register and resolve schemas
//! rivven-schema-client register --subject users-value --file user.avsc
//! rivven-schema-client latest --subject users-value
//! ```

use clap::{Parser, Subcommand};
use rivven_schema_client::{
    CallContext, ClientConfig, CompatibilityLevel, EmulatorConfig, EmulatorServer, Schema,
    SchemaCatalog, SchemaId, SchemaRegistryClient, SchemaType,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "rivven-schema-client")]
#[command(
    author,
    version,
    about = "Rivven Schema Client - caching registry client and catalog emulator"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Schema registry URL
    #[arg(long, default_value = "http://localhost:8081", global = true)]
    url: String,

    /// Basic auth user
    #[arg(long, global = true)]
    username: Option<String>,

    /// Basic auth password
    #[arg(long, global = true)]
    password: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the catalog emulator
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8081")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Global compatibility level reported by GET /config
        #[arg(long, default_value = "BACKWARD")]
        compatibility: String,
    },

    #[command(flatten)]
    Client(ClientCommand),
}

/// Commands that talk to a registry
#[derive(Subcommand)]
enum ClientCommand {
    /// List subjects
    Subjects,

    /// Get schema by ID
    Get {
        /// Schema ID
        #[arg(short, long)]
        id: u32,
    },

    /// Get the latest version of a subject
    Latest {
        /// Subject name
        #[arg(short, long)]
        subject: String,
    },

    /// Register a schema
    Register {
        /// Subject name
        #[arg(short, long)]
        subject: String,

        /// Schema type (avro, json, protobuf)
        #[arg(short = 't', long, default_value = "avro")]
        schema_type: String,

        /// Schema file path
        #[arg(short = 'f', long)]
        file: String,
    },

    /// Check whether an equivalent schema is already registered
    Exists {
        /// Subject name
        #[arg(short, long)]
        subject: String,

        /// Schema type (avro, json, protobuf)
        #[arg(short = 't', long, default_value = "avro")]
        schema_type: String,

        /// Schema file path
        #[arg(short = 'f', long)]
        file: String,
    },

    /// Delete a subject and all its versions
    DeleteSubject {
        /// Subject name
        #[arg(short, long)]
        subject: String,

        /// Hard delete
        #[arg(long)]
        permanent: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase())),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let Cli {
        command,
        url,
        username,
        password,
        timeout,
        ..
    } = cli;

    match command {
        Commands::Serve {
            port,
            host,
            compatibility,
        } => serve(port, host, &compatibility).await,
        Commands::Client(command) => {
            let mut config = ClientConfig::new(url).with_timeout_secs(timeout);
            if let Some(username) = username {
                config = config.with_credentials(username, password.unwrap_or_default());
            }
            let client = SchemaRegistryClient::new(config)?;
            let ctx = CallContext::new().with_timeout(Duration::from_secs(timeout));
            run_client(&client, &ctx, command).await
        }
    }
}

async fn run_client(
    client: &SchemaRegistryClient,
    ctx: &CallContext,
    command: ClientCommand,
) -> anyhow::Result<()> {
    match command {
        ClientCommand::Subjects => {
            let subjects = client.list_subjects(ctx).await?;
            println!("Subjects ({}):", subjects.len());
            for subject in subjects {
                println!("  - {}", subject);
            }
            Ok(())
        }
        ClientCommand::Get { id } => {
            let schema = client.get_schema_by_id(ctx, SchemaId::new(id)).await?;
            print_schema(&schema)
        }
        ClientCommand::Latest { subject } => {
            let schema = client.get_latest_schema(ctx, &subject).await?;
            print_schema(&schema)
        }
        ClientCommand::Register {
            subject,
            schema_type,
            file,
        } => {
            let schema_type: SchemaType = schema_type.parse()?;
            let text = std::fs::read_to_string(&file)?;
            let schema = client
                .register_schema(ctx, &subject, &text, schema_type, &[])
                .await?;
            println!("✓ Schema registered successfully");
            println!("  Subject: {}", schema.subject());
            println!("  Schema ID: {}", schema.id());
            println!("  Version: {}", schema.version());
            Ok(())
        }
        ClientCommand::Exists {
            subject,
            schema_type,
            file,
        } => {
            let schema_type: SchemaType = schema_type.parse()?;
            let text = std::fs::read_to_string(&file)?;
            match client
                .check_schema_exists(ctx, &subject, &text, schema_type, &[])
                .await
            {
                Ok(schema) => {
                    println!("✓ Schema already registered");
                    print_schema(&schema)
                }
                Err(e) if e.is_not_found() => {
                    println!("✗ Schema is not registered under {}", subject);
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        ClientCommand::DeleteSubject { subject, permanent } => {
            let versions = client.delete_subject(ctx, &subject, permanent).await?;
            println!("✓ Deleted {} version(s) of {}: {:?}", versions.len(), subject, versions);
            Ok(())
        }
    }
}

async fn serve(port: u16, host: String, compatibility: &str) -> anyhow::Result<()> {
    let compatibility: CompatibilityLevel = compatibility.parse()?;
    info!("Starting Rivven schema catalog emulator on {}:{}", host, port);
    info!("Default compatibility: {}", compatibility);

    let config = EmulatorConfig::default()
        .with_host(host)
        .with_port(port)
        .with_compatibility(compatibility);
    let server = EmulatorServer::new(Arc::new(SchemaCatalog::new()), config);

    info!("API endpoints:");
    info!("  POST /subjects/{{subject}}/versions - Register schema");
    info!("  POST /subjects/{{subject}} - Look up equivalent schema");
    info!("  GET  /schemas/ids/{{id}} - Get schema by ID");
    info!("  GET  /subjects - List subjects");

    server.run().await?;
    Ok(())
}

fn print_schema(schema: &Schema) -> anyhow::Result<()> {
    let value = serde_json::json!({
        "subject": schema.subject().as_str(),
        "id": schema.id().as_u32(),
        "version": schema.version(),
        "schemaType": schema.schema_type(),
        "schema": schema.schema(),
        "references": schema.references(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
