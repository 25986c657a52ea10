//! Initialize a new spacetraveling site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
static_dir: static

# Date / Time format (date-fns tokens)
date_format: d MMM y
edited_format: "d MMM y', às' HH:mm"

# Seconds between regenerations while serving
revalidate: 86400

# Previous/next links: chronological or cursor
navigation: chronological

# Content API
# PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these values
prismic:
  endpoint: ''
  access_token:
  document_type: posts
  page_size: 2
  paths_page_size: 100

reading:
  words_per_minute: 200

# utterances comments, uncomment to enable
# comments:
#   repo: owner/repo
#   issue_term: pathname
#   theme: github-dark
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="27" viewBox="0 0 239 27">
  <text x="0" y="22" font-family="Inter, sans-serif" font-size="24" fill="#ffffff">spacetraveling<tspan fill="#ff57b2">.</tspan></text>
</svg>
"##;

const SAMPLE_POSTS: &str = r#"[
  {
    "id": "sample-1",
    "uid": "como-utilizar-hooks",
    "type": "posts",
    "first_publication_date": "2021-03-15T19:25:28+0000",
    "last_publication_date": "2021-03-15T19:25:28+0000",
    "data": {
      "title": "Como utilizar Hooks",
      "subtitle": "Pensando em sincronização em vez de ciclos de vida.",
      "author": "Joseph Oliveira",
      "banner": { "url": null },
      "content": [
        {
          "heading": "Proin et varius",
          "body": [
            { "type": "paragraph", "text": "Lorem ipsum dolor sit amet, consectetur adipiscing elit.", "spans": [] }
          ]
        }
      ]
    }
  },
  {
    "id": "sample-2",
    "uid": "criando-um-app-cra-do-zero",
    "type": "posts",
    "first_publication_date": "2021-03-25T19:27:35+0000",
    "last_publication_date": null,
    "data": {
      "title": "Criando um app CRA do zero",
      "subtitle": "Tudo sobre como criar a sua primeira aplicação utilizando Create React App",
      "author": "Danilo Vieira",
      "banner": { "url": null },
      "content": []
    }
  }
]
"#;

/// Initialize a new site in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static"))?;
    fs::create_dir_all(target_dir.join("fixtures"))?;

    for (path, content) in [
        (target_dir.join(CONFIG_FILE), CONFIG_TEMPLATE),
        (target_dir.join("static/spacetraveling.svg"), LOGO),
        (target_dir.join("fixtures/posts.json"), SAMPLE_POSTS),
    ] {
        if path.exists() {
            tracing::debug!("Keeping existing {:?}", path);
            continue;
        }
        fs::write(&path, content)?;
        tracing::debug!("Created {:?}", path);
    }

    Ok(())
}
