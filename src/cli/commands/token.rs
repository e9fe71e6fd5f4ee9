use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims, Role};
use crate::cli::output::{output_success, output_table};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::validation::ObjectId;

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long, default_value = "owner", help = "Role: owner, admin, partner, lawyer, accountant, hr, staff")]
    pub role: String,

    #[arg(long, help = "Firm id; omit for a solo-lawyer token")]
    pub firm: Option<String>,

    #[arg(long, help = "User id; a fresh one is generated when omitted")]
    pub user: Option<String>,

    #[arg(long, help = "Lifetime in hours (defaults to the configured expiry)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let role: Role = args.role.parse().map_err(|e| anyhow::anyhow!("{}", e))?;
    let user = match args.user.as_deref() {
        Some(raw) => ObjectId::parse(raw).context("--user")?,
        None => ObjectId::new(),
    };
    let firm = args.firm.as_deref().map(ObjectId::parse).transpose().context("--firm")?;
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);

    let claims = Claims::new(user.clone(), firm.clone(), role, hours);
    let token = generate_jwt(&claims, &config.security).context("failed to sign token")?;

    match output_format {
        OutputFormat::Json => output_success(
            output_format,
            "Token issued",
            Some(json!({
                "token": token,
                "userId": user,
                "firmId": firm,
                "role": role,
                "expiresInHours": hours,
            })),
        ),
        OutputFormat::Text => {
            output_table(&[
                ("user".to_string(), user.to_string()),
                ("firm".to_string(), firm.map(|f| f.to_string()).unwrap_or_else(|| "(solo)".to_string())),
                ("role".to_string(), role.to_string()),
                ("expires".to_string(), format!("{}h", hours)),
            ]);
            println!("{}", token);
            Ok(())
        }
    }
}
