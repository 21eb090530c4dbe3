// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `issue-token` command.

use gatehouse_api::{TokenCodec, TokenSubject};

use crate::cli::{Cli, IssueTokenArgs};
use crate::error::{BinError, BinResult};
use crate::settings::{Settings, SettingsLoader};

/// Executes the `issue-token` command and prints the token.
pub fn issue_token(cli: &Cli, args: IssueTokenArgs) -> BinResult<()> {
    let settings = SettingsLoader::new().load(&cli.config)?;

    println!("{}", sign(&settings, &args)?);

    Ok(())
}

/// Signs a token for the identity described by `args`.
///
/// Without `--id`, the ID of the matching seed user is used.
pub fn sign(settings: &Settings, args: &IssueTokenArgs) -> BinResult<String> {
    let id = match args.id {
        Some(id) => id,
        None => settings
            .find_user(&args.username, &args.email)
            .map(|user| user.effective_id())
            .ok_or_else(|| {
                BinError::config(format!(
                    "No seed user matches {} / {}; pass --id",
                    args.username, args.email
                ))
            })?,
    };

    let codec = TokenCodec::new(settings.server.jwt.clone())?;
    let subject = TokenSubject::new(id, &args.email, &args.username);

    Ok(codec.issue(&subject)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SeedUser;
    use gatehouse_api::{ApiConfig, JwtConfig};

    fn settings() -> Settings {
        Settings {
            server: ApiConfig::new().with_jwt(JwtConfig::new("issue-test-secret-that-is-long-enough")),
            users: vec![SeedUser {
                id: None,
                email: "ada@example.com".to_string(),
                username: "ada".to_string(),
                full_name: "Ada Lovelace".to_string(),
                verified: true,
            }],
        }
    }

    #[test]
    fn test_sign_for_seed_user() {
        let settings = settings();
        let args = IssueTokenArgs {
            id: None,
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
        };

        let token = sign(&settings, &args).unwrap();
        let codec = TokenCodec::new(settings.server.jwt.clone()).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.id, settings.users[0].effective_id());
        assert_eq!(claims.username, "ada");
    }

    #[test]
    fn test_sign_unknown_user_requires_id() {
        let args = IssueTokenArgs {
            id: None,
            email: "nobody@example.com".to_string(),
            username: "nobody".to_string(),
        };

        assert!(sign(&settings(), &args).is_err());
    }
}
