//! HTML rendering for index pages
//!
//! Two templates cover the whole surface: the root index of
//! distribution names and the per-distribution file listing. Embedded
//! defaults are used unless the server is configured with an
//! `html_dir`, in which case templates load from disk.

use minijinja::{Environment, path_loader};
use std::path::Path;

pub const ROOT_TEMPLATE: &str = "index.html";
pub const LISTING_TEMPLATE: &str = "listing.html";

const ROOT_DEFAULT: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Simple index</title></head>
  <body>
{%- if names %}
{%- for name in names %}
    <a href="{{ base_path }}/simple/{{ name|urlencode }}/">{{ name }}</a><br/>
{%- endfor %}
{%- else %}
    <!-- empty-index -->
{%- endif %}
  </body>
</html>
"#;

const LISTING_DEFAULT: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Links for {{ name }}</title></head>
  <body>
    <h1>Links for {{ name }}</h1>
{%- for file in files %}
    <a href="{{ base_path }}/simple/{{ name|urlencode }}/{{ file|urlencode }}">{{ file }}</a><br/>
{%- endfor %}
  </body>
</html>
"#;

/// Build the template environment. With an `html_dir` the embedded
/// templates are replaced wholesale by files of the same names.
pub fn environment(html_dir: Option<&Path>) -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    match html_dir {
        Some(dir) => env.set_loader(path_loader(dir)),
        None => {
            env.add_template(ROOT_TEMPLATE, ROOT_DEFAULT)?;
            env.add_template(LISTING_TEMPLATE, LISTING_DEFAULT)?;
        }
    }
    Ok(env)
}
