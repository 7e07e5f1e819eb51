//! List posts from the CMS

use anyhow::Result;

use crate::cms::ContentSource;
use crate::helpers::DateFormatter;
use crate::listing::ListingFeed;
use crate::Site;

/// Walk every listing page and print the posts
pub async fn run(site: &Site) -> Result<()> {
    let client = site.client()?;
    let lines = collect(site, &client).await?;

    println!("Posts ({}):", lines.len());
    for line in lines {
        println!("  {}", line);
    }

    Ok(())
}

/// One line per post, following the cursor to the last page
pub async fn collect(site: &Site, source: &dyn ContentSource) -> Result<Vec<String>> {
    let dates = DateFormatter::new(&site.config.dates)?;

    let mut feed = ListingFeed::initial(source, &site.config, None).await?;
    feed.load_all(source).await?;

    Ok(feed
        .posts()
        .iter()
        .map(|post| {
            format!(
                "{} - {} [{}]",
                dates.detail(post.first_publication_date.as_deref()),
                post.title,
                post.uid
            )
        })
        .collect())
}
