//! Runner executing one parsed command against the backend

use crate::authentication::{AuthType, AuthenticationModule, Authenticator, RestAuthenticationModule};
use crate::cli::args::{Args, Command, Credentials};
use crate::common::channel;
use crate::config::{ClientConfig, ConfigOverrides};
use crate::error::{PipeError, Result};
use crate::logging::Logger;
use crate::pipeline::{Pipe, PipeConfig, Pipeline};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const MODULE_NAME: &str = "cli";

pub struct Runner {
    args: Args,
    logger: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let logger = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Self { args, logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn run(&self) -> Result<()> {
        self.args.validate()?;

        let config = self.client_config();
        config.validate()?;

        self.logger.section(self.args.command.name());
        if config.skip_tls {
            self.logger
                .warning("TLS certificate verification is disabled");
        }
        self.logger.summary_kv(
            "Configuration",
            &[
                ("Base URL", self.args.base_url.clone()),
                ("Timeout", format!("{}s", config.timeout)),
                ("Skip TLS", config.skip_tls.to_string()),
            ],
        );

        let authenticator = Authenticator::new(self.logger.clone());

        match &self.args.command {
            Command::Login { username, password } => {
                let module = self.auth_module(&authenticator, &config)?;
                self.login(&module, username, password).await?;
                self.logger.success(&format!(
                    "Logged in as {} (token {})",
                    username,
                    self.logger.redact(&module.auth_token())
                ));
            }
            Command::Enroll { fields } => {
                let module = self.auth_module(&authenticator, &config)?;
                let user_data: HashMap<String, String> = fields.iter().cloned().collect();

                let (callback, completion) = channel();
                module.enroll(user_data, callback)?;
                let response = completion.await?;

                self.logger.success(&format!(
                    "Enrolled and logged in (token {})",
                    self.logger.redact(&module.auth_token())
                ));
                self.print_body(&response.body_text());
            }
            Command::Read {
                resource,
                credentials,
            } => {
                let pipe = self
                    .pipe(&authenticator, &config, resource, "id", credentials)
                    .await?;

                let (callback, completion) = channel();
                pipe.read(callback)?;
                let items = completion.await?;

                self.logger
                    .info(&format!("Read {} element(s) from {}", items.len(), pipe.url()));
                self.print_json(&Value::Array(items))?;
            }
            Command::Save {
                resource,
                item,
                record_id,
                credentials,
            } => {
                let item: Value = serde_json::from_str(item).map_err(|e| {
                    PipeError::Validation(format!("Item is not valid JSON: {}", e))
                })?;
                let pipe = self
                    .pipe(&authenticator, &config, resource, record_id, credentials)
                    .await?;

                let (callback, completion) = channel();
                pipe.save(item, callback)?;
                let saved = completion.await?;

                self.logger.success(&format!("Saved element to {}", pipe.url()));
                self.print_json(&saved)?;
            }
            Command::Remove {
                resource,
                id,
                credentials,
            } => {
                let pipe = self
                    .pipe(&authenticator, &config, resource, "id", credentials)
                    .await?;

                let (callback, completion) = channel();
                pipe.remove(id, callback)?;
                completion.await?;

                self.logger
                    .success(&format!("Removed element {} from {}", id, pipe.url()));
            }
        }

        self.logger.verbose(&format!(
            "Finished in {}",
            self.logger.format_duration(self.logger.elapsed())
        ));
        Ok(())
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::from_env().merge(&self.config_overrides())
    }

    /// Only what was passed on the command line; unset flags defer to the environment
    fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            timeout: self.args.timeout,
            skip_tls: self.args.skip_tls.then_some(true),
            verbose: self.args.verbose.then_some(true),
            ..ConfigOverrides::default()
        }
    }

    fn auth_module(
        &self,
        authenticator: &Authenticator,
        config: &ClientConfig,
    ) -> Result<Arc<RestAuthenticationModule>> {
        authenticator
            .auth(AuthType::Rest, self.args.base_url.clone())?
            .login_endpoint(self.args.login_endpoint.clone())
            .logout_endpoint(self.args.logout_endpoint.clone())
            .enroll_endpoint(self.args.enroll_endpoint.clone())
            .config(config.clone())
            .add(MODULE_NAME)
    }

    async fn login(
        &self,
        module: &RestAuthenticationModule,
        username: &str,
        password: &str,
    ) -> Result<()> {
        self.logger
            .verbose(&format!("Logging in to {}", module.login_url()));

        let (callback, completion) = channel();
        module.login(username, password, callback)?;
        completion.await?;
        Ok(())
    }

    /// Pipe for `resource`, logged in first when credentials were given
    async fn pipe(
        &self,
        authenticator: &Authenticator,
        config: &ClientConfig,
        resource: &str,
        record_id: &str,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Pipe<Value>>> {
        let pipeline = Pipeline::with_config(&self.args.base_url, config, self.logger.clone())?;
        let pipe = pipeline.pipe::<Value>(PipeConfig::new(resource).with_record_id(record_id))?;

        if let Some((username, password)) = credentials.pair() {
            let module = self.auth_module(authenticator, config)?;
            self.login(&module, username, password).await?;
            pipe.set_authentication_module(module);
        }

        Ok(pipe)
    }

    fn print_json(&self, value: &Value) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn print_body(&self, body: &str) {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => {
                if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                    println!("{}", pretty);
                }
            }
            Err(_) if !body.trim().is_empty() => println!("{}", body),
            Err(_) => {}
        }
    }
}
