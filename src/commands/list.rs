//! List site content

use anyhow::Result;

use crate::content::loader::relative_source;
use crate::error::DocumentError;
use crate::generator::Generator;
use crate::Site;

/// One line of `list` output
#[derive(Debug)]
pub enum Listing {
    Page {
        slug: String,
        layout: String,
        title: String,
        source: String,
    },
    Issue(DocumentError),
}

/// Collect what a build would produce, without writing anything.
/// Documents are rendered so the listing matches the build exactly.
pub fn collect(site: &Site) -> Result<Vec<Listing>> {
    let plan = Generator::new(site)?.plan()?;

    let listings = plan
        .outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Ok(page) => Listing::Page {
                slug: page.slug.to_string(),
                source: relative_source(&site.input_dir, &page.source),
                layout: page.layout,
                title: page.title,
            },
            Err(issue) => Listing::Issue(issue),
        })
        .collect();

    Ok(listings)
}

/// Print every document's slug, layout, title and source
pub fn run(site: &Site) -> Result<()> {
    let listings = collect(site)?;
    let pages = listings
        .iter()
        .filter(|l| matches!(l, Listing::Page { .. }))
        .count();

    println!(
        "Documents ({}, {} with issues):",
        listings.len(),
        listings.len() - pages
    );
    for listing in listings {
        match listing {
            Listing::Page {
                slug,
                layout,
                title,
                source,
            } => println!("  {} [{}] {} ({})", slug, layout, title, source),
            Listing::Issue(issue) => println!("  ! {}", issue),
        }
    }

    Ok(())
}
