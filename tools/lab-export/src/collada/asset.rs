//! `<asset>` block

use chrono::{SecondsFormat, Utc};

use super::BuildOptions;
use super::document::ColladaWriter;

pub(crate) fn write_asset(w: &mut ColladaWriter, options: &BuildOptions) {
    let created = options
        .created
        .unwrap_or_else(Utc::now)
        .to_rfc3339_opts(SecondsFormat::Secs, true);

    w.start("asset");

    w.start("contributor");
    w.leaf("author", &options.author);
    w.leaf("authoring_tool", &options.authoring_tool);
    w.end();

    w.leaf("created", &created);
    w.leaf("modified", &created);

    w.start("unit");
    w.attr("name", if options.meter == 1.0 { "meter" } else { "unit" });
    w.attr("meter", &options.meter);
    w.end();

    w.leaf("up_axis", options.up_axis.collada_name());

    w.end();
}
