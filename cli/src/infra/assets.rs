//! Site scripts embedded in the staging binary.

use include_dir::{Dir, include_dir};

use crate::application::services::stager::SiteScript;

static SITE_SCRIPTS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/assets/zeekscripts");

/// Every embedded site script, with paths relative to the site directory.
#[must_use]
pub fn site_scripts() -> Vec<SiteScript<'static>> {
    let mut scripts = Vec::new();
    collect(&SITE_SCRIPTS, &mut scripts);
    scripts.sort_by(|a, b| a.path.cmp(b.path));
    scripts
}

fn collect(dir: &'static Dir<'static>, out: &mut Vec<SiteScript<'static>>) {
    for file in dir.files() {
        out.push(SiteScript {
            path: file.path(),
            contents: file.contents(),
        });
    }
    for sub in dir.dirs() {
        collect(sub, out);
    }
}
