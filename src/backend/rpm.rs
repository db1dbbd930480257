//! RPM spec file generation
//!
//! Fills an RPM spec template from a job descriptor. The template's own
//! syntax is opaque; only `@KEY@` placeholders are replaced.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::template::render_template;
use super::{Backend, BackendError, PackageContext};
use crate::config::BuildParams;
use crate::job::JobDescriptor;
use crate::spec::{resolve_spec_params, SpecLine};

/// Directory under the build root receiving generated spec files
pub const SPEC_DIR: &str = "rpmspec";

/// RPM package names use `-` where buildset names use `_` or `/`
fn esc_name(s: &str) -> String {
    s.replace(['_', '/'], "-")
}

/// RPM release labels cannot contain `-`
fn esc_label(s: &str) -> String {
    s.replace('-', "_")
}

/// `%define` lines for the resolved spec parameters
fn spec_defines(lines: &[SpecLine]) -> String {
    lines
        .iter()
        .map(|line| match line {
            SpecLine::Define { key, value } => format!("%define {} {}", key, value),
            SpecLine::Comment(text) => format!("# {}", text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// RPM spec backend
#[derive(Debug, Default)]
pub struct RpmBackend;

impl RpmBackend {
    /// Placeholder values for one job
    pub fn values(
        &self,
        job: &JobDescriptor,
        ctx: &PackageContext<'_>,
    ) -> Result<BTreeMap<String, String>, BackendError> {
        let params = ctx.params;
        let lines = resolve_spec_params(ctx.spec_config, &job.buildset, &params.spec_overrides)?;
        let released = if params.released {
            "released"
        } else {
            "not-released"
        };

        let values = [
            ("RSB_BUILDROOT", params.build_dir().join("buildroot").display().to_string()),
            ("RSB_PKG_NAME", job.name.clone()),
            ("PREFIX", params.prefix.clone()),
            ("RSB_VERSION", params.version.clone()),
            ("RSB_REVISION", esc_label(&params.revision)),
            ("RSB_RELEASED", released.to_string()),
            ("TARFILE", job.archive_path.display().to_string()),
            ("RSB_SET_BUILDER", job.command.clone()),
            ("RSB_SET_BUILDER_ARGS", job.package_args.join(" ")),
            ("RSB_WORK_PATH", params.top.display().to_string()),
            ("RSB_SPEC_DEFINES", spec_defines(&lines)),
        ];

        Ok(values
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect())
    }
}

impl Backend for RpmBackend {
    fn name(&self) -> &'static str {
        "rpm"
    }

    fn description(&self) -> &'static str {
        "Generate RPM spec files"
    }

    fn default_template(&self) -> &'static str {
        "pkg/rpm.spec.in"
    }

    fn output_path(&self, job: &JobDescriptor, params: &BuildParams) -> PathBuf {
        params
            .build_dir()
            .join(SPEC_DIR)
            .join(format!("{}.spec", esc_name(job.buildset.as_str())))
    }

    fn render(&self, job: &JobDescriptor, ctx: &PackageContext<'_>) -> Result<String, BackendError> {
        Ok(render_template(ctx.template, &self.values(job, ctx)?))
    }
}
