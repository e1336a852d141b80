//! Export orchestration.
//!
//! A run moves through `OPEN_BACKEND -> WRITE_METADATA -> SELECT_TARGETS ->
//! STREAM_ENTITY* -> CLOSE`. The schema is fetched before the backend is
//! opened so that an incomplete schema leaves no output behind. Failures of a
//! single entity or row are recorded in the [`ExportReport`] and the run
//! carries on; only [`ExportError`]s stop it.

use crate::backend::{open_backend, ExportBackend};
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::report::{EntityStats, ExportException, ExportReport};
use crate::selection::{select_targets, unmatched_requests};
use downloader_api::{
    ClientError, Credentials, Entity, MetadataRepository, MolgenisClient, MolgenisVersion,
};
use log::{debug, info, warn};
use std::time::Instant;

/// Entities to stream and the schema they were selected from.
struct Plan {
    metadata: Option<MetadataRepository>,
    targets: Vec<String>,
}

/// Runs exports against a client.
pub struct Exporter<'c, C: MolgenisClient + ?Sized> {
    client: &'c C,
}

impl<'c, C: MolgenisClient + ?Sized> Exporter<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self { client }
    }

    /// Export to the output described by `config`.
    ///
    /// The backend is closed on every path, including failures.
    ///
    /// # Errors
    ///
    /// - [`ExportError::IncompleteMetadata`] if a requested entity depends on a missing one
    /// - [`ExportError::OutputConflict`] if the output exists and overwriting is off
    /// - [`ExportError::Storage`] if the output cannot be written
    pub fn export(&self, config: &ExportConfig) -> Result<ExportReport> {
        let started = Instant::now();
        let version = self.version(config)?;
        let plan = self.plan(config, version)?;

        let mut backend = open_backend(config)?;
        let written = self.write(backend.as_mut(), plan, config, version);
        let closed = backend.close();

        match (written, closed) {
            (Ok(mut report), Ok(())) => {
                report.elapsed = started.elapsed();
                info!(
                    "Export finished in {:?} with {} exceptions",
                    report.elapsed,
                    report.exceptions.len()
                );
                Ok(report)
            }
            (Ok(_), Err(err)) => Err(err),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!("Failed to close output after error: {close_err}");
                }
                Err(err)
            }
        }
    }

    /// Export into a backend the caller owns and closes.
    pub fn export_into(
        &self,
        backend: &mut dyn ExportBackend,
        config: &ExportConfig,
    ) -> Result<ExportReport> {
        let started = Instant::now();
        let version = self.version(config)?;
        let plan = self.plan(config, version)?;
        let mut report = self.write(backend, plan, config, version)?;
        report.elapsed = started.elapsed();
        Ok(report)
    }

    fn version(&self, config: &ExportConfig) -> Result<MolgenisVersion> {
        match config.version {
            Some(version) => Ok(version),
            None => {
                let version = self.client.get_version()?;
                info!("Server version {version}");
                Ok(version)
            }
        }
    }

    /// Without metadata the requested names are exported verbatim; with
    /// metadata they are expanded against the filtered schema.
    fn plan(&self, config: &ExportConfig, version: MolgenisVersion) -> Result<Plan> {
        if !config.include_metadata {
            if config.entities.is_empty() {
                info!("No entities requested, only an empty output will be written");
            }
            return Ok(Plan {
                metadata: None,
                targets: config.entities.clone(),
            });
        }

        let metadata = self
            .client
            .get_filtered_metadata(version, &config.entities)?
            .with_version(version);
        metadata.check_integrity()?;
        for name in unmatched_requests(&config.entities, &metadata, version) {
            warn!("Requested entity {name} is not part of the schema");
        }
        let targets = select_targets(&config.entities, &metadata, version);
        info!(
            "Selected {} of {} entities for export",
            targets.len(),
            metadata.len()
        );
        Ok(Plan {
            metadata: Some(metadata),
            targets,
        })
    }

    fn write(
        &self,
        backend: &mut dyn ExportBackend,
        plan: Plan,
        config: &ExportConfig,
        version: MolgenisVersion,
    ) -> Result<ExportReport> {
        let mut report = ExportReport::default();

        if let Some(metadata) = &plan.metadata {
            info!("Writing metadata");
            backend.write_metadata(metadata, version)?;
        }

        for name in &plan.targets {
            self.export_entity(
                backend,
                plan.metadata.as_ref(),
                name,
                config,
                version,
                &mut report,
            )?;
        }
        Ok(report)
    }

    fn export_entity(
        &self,
        backend: &mut dyn ExportBackend,
        metadata: Option<&MetadataRepository>,
        name: &str,
        config: &ExportConfig,
        version: MolgenisVersion,
        report: &mut ExportReport,
    ) -> Result<()> {
        info!("Exporting {name}");

        let fetched;
        let (schema, entity): (&MetadataRepository, &Entity) = match metadata {
            Some(metadata) => match metadata.entity_by_key(name, version) {
                Some(entity) => (metadata, entity),
                None => {
                    record(report, not_found(name));
                    return Ok(());
                }
            },
            None => {
                fetched = match self.client.get_entity(name) {
                    Ok(schema) => schema.with_version(version),
                    Err(err) => {
                        record(report, ExportException::from_client(name, err));
                        return Ok(());
                    }
                };
                if let Err(err) = fetched.check_integrity() {
                    record(
                        report,
                        ExportException::Entity {
                            entity: name.to_string(),
                            source: err.into(),
                        },
                    );
                    return Ok(());
                }
                match fetched.entity_by_key(name, version) {
                    Some(entity) => (&fetched, entity),
                    None => {
                        record(report, not_found(name));
                        return Ok(());
                    }
                }
            }
        };

        let pages = match self
            .client
            .stream_entity_data(name, config.effective_page_size())
        {
            Ok(pages) => pages,
            Err(err) => {
                record(report, ExportException::from_client(name, err));
                return Ok(());
            }
        };

        if let Err(err) = backend.begin_entity(schema, entity, version) {
            if err.is_fatal() {
                return Err(err);
            }
            record(
                report,
                ExportException::Entity {
                    entity: name.to_string(),
                    source: err,
                },
            );
            return Ok(());
        }

        let mut stats = EntityStats {
            entity: name.to_string(),
            rows: 0,
            units: 0,
        };
        for page in pages {
            let page = match page {
                Ok(page) => page,
                Err(err) => {
                    record(report, ExportException::from_client(name, err));
                    break;
                }
            };
            debug!("{name}: page of {} rows", page.len());

            for row in &page {
                let outcome = backend.write_row(row)?;
                for source in outcome.errors {
                    record(
                        report,
                        ExportException::Encoding {
                            entity: name.to_string(),
                            row: stats.rows,
                            source,
                        },
                    );
                }
                stats.rows += 1;
                stats.units += outcome.units;
            }
        }
        backend.end_entity()?;

        info!(
            "Exported {name}: {} rows, {} output units",
            stats.rows, stats.units
        );
        report.entities.push(stats);
        Ok(())
    }
}

fn not_found(name: &str) -> ExportException {
    ExportException::from_client(name, ClientError::NotFound(name.to_string()))
}

fn record(report: &mut ExportReport, exception: ExportException) {
    warn!("{exception}");
    report.exceptions.push(exception);
}

/// Log in, export and log out.
///
/// Logout is attempted even when the export fails; a failed logout is only logged.
///
/// # Errors
///
/// Returns [`ExportError::Authentication`] if the credentials are rejected,
/// before anything else happens, and any error of [`Exporter::export`].
pub fn run<C: MolgenisClient + ?Sized>(
    client: &mut C,
    credentials: &Credentials,
    config: &ExportConfig,
) -> Result<ExportReport> {
    info!("Logging in as {}", credentials.username);
    client.login(credentials).map_err(ExportError::from)?;

    let result = Exporter::new(&*client).export(config);

    match client.logout() {
        Ok(true) => debug!("Logged out"),
        Ok(false) => debug!("No session to log out from"),
        Err(err) => warn!("Logout failed: {err}"),
    }
    result
}
