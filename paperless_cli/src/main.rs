//! paperless-cli - manage documents in a Paperless-ngx archive
//!
//! Tags, correspondents, document types, search, uploads with consumer
//! task polling, and bulk tag operations. Every listing can be printed
//! as an aligned table or, with `--json`, as raw JSON for scripting.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use paperless_cli::api::PaperlessApi;
use paperless_cli::models::{
    BulkEditMethod, DocumentSearch, DocumentUpdate, DocumentUpload, TagCreate, Task,
};
use paperless_cli::tables;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Manage documents in a Paperless-ngx instance
#[derive(Parser, Debug)]
#[command(name = "paperless-cli")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the Paperless-ngx instance
    #[arg(long, env = "PAPERLESS_URL")]
    url: String,

    /// API token
    #[arg(long, env = "PAPERLESS_TOKEN")]
    token: String,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Display additional information
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage tags
    Tags {
        #[command(subcommand)]
        command: TagsCommand,
    },
    /// Search, inspect and change documents
    Documents {
        #[command(subcommand)]
        command: DocumentsCommand,
    },
    /// List correspondents
    Correspondents {
        #[command(subcommand)]
        command: CorrespondentsCommand,
    },
    /// List document types
    DocumentTypes {
        #[command(subcommand)]
        command: DocumentTypesCommand,
    },
    /// Inspect background tasks
    Tasks {
        #[command(subcommand)]
        command: TasksCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TagsCommand {
    /// List all tags
    List,
    /// Create a tag
    Create {
        /// Name of the new tag
        name: String,
        /// Hex color like "#a6cee3"
        #[arg(long)]
        color: Option<String>,
        /// Mark the tag as an inbox tag
        #[arg(long)]
        inbox: bool,
    },
    /// Delete a tag
    Delete {
        /// Id of the tag
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DocumentsCommand {
    /// Search documents
    Search {
        /// Full text query
        #[arg(long)]
        query: Option<String>,
        /// Only documents carrying all of these tags (comma separated names)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Result page
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Results per page
        #[arg(long, default_value_t = 25)]
        page_size: u32,
        /// Sort order, e.g. -created
        #[arg(long)]
        ordering: Option<String>,
    },
    /// Show one document
    Show {
        /// Id of the document
        id: u64,
        /// Show the extracted metadata instead of the details
        #[arg(long)]
        metadata: bool,
    },
    /// Update title, correspondent, document type or tags
    Update {
        /// Id of the document
        id: u64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// Id of the new correspondent
        #[arg(long)]
        correspondent: Option<u64>,
        /// Id of the new document type
        #[arg(long)]
        document_type: Option<u64>,
        /// Tags to add (comma separated names)
        #[arg(long, value_delimiter = ',')]
        add_tags: Vec<String>,
        /// Tags to remove (comma separated names)
        #[arg(long, value_delimiter = ',')]
        remove_tags: Vec<String>,
        /// Replace all tags (comma separated names)
        #[arg(long, value_delimiter = ',', conflicts_with_all = ["add_tags", "remove_tags"])]
        set_tags: Option<Vec<String>>,
    },
    /// Delete a document
    Delete {
        /// Id of the document
        id: u64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Download a document
    Download {
        /// Id of the document
        id: u64,
        /// Download the original file instead of the archived version
        #[arg(long)]
        original: bool,
        /// Where to write the file (defaults to the server's filename)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Upload a document and wait for it to be consumed
    Upload {
        /// File to upload
        file: PathBuf,
        /// Title of the new document
        #[arg(long)]
        title: Option<String>,
        /// Tags for the new document (comma separated names)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Id of the correspondent
        #[arg(long)]
        correspondent: Option<u64>,
        /// Id of the document type
        #[arg(long)]
        document_type: Option<u64>,
        /// Do not wait for the consumer task
        #[arg(long)]
        no_wait: bool,
    },
    /// Add or remove one tag on many documents
    BulkTag {
        /// Ids of the documents
        #[arg(required = true)]
        ids: Vec<u64>,
        /// Tag to add
        #[arg(long, conflicts_with = "remove")]
        add: Option<String>,
        /// Tag to remove
        #[arg(long)]
        remove: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CorrespondentsCommand {
    /// List all correspondents
    List,
}

#[derive(Subcommand, Debug)]
enum DocumentTypesCommand {
    /// List all document types
    List,
}

#[derive(Subcommand, Debug)]
enum TasksCommand {
    /// Wait for a background task to finish
    Wait {
        /// Task uuid as returned by an upload
        task_id: String,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let api = PaperlessApi::new(args.url.clone(), args.token.clone());
    let json = args.json;

    match args.command {
        Command::Tags { command } => match command {
            TagsCommand::List => cmd_tags_list(&api, json).await,
            TagsCommand::Create { name, color, inbox } => {
                cmd_tags_create(&api, name, color, inbox, json).await
            }
            TagsCommand::Delete { id, yes } => cmd_tags_delete(&api, id, yes).await,
        },
        Command::Documents { command } => match command {
            DocumentsCommand::Search {
                query,
                tags,
                page,
                page_size,
                ordering,
            } => cmd_documents_search(&api, query, tags, page, page_size, ordering, json).await,
            DocumentsCommand::Show { id, metadata } => {
                cmd_documents_show(&api, id, metadata, json).await
            }
            DocumentsCommand::Update {
                id,
                title,
                correspondent,
                document_type,
                add_tags,
                remove_tags,
                set_tags,
            } => {
                let update = Update {
                    title,
                    correspondent,
                    document_type,
                    add_tags,
                    remove_tags,
                    set_tags,
                };
                cmd_documents_update(&api, id, update, json).await
            }
            DocumentsCommand::Delete { id, yes } => cmd_documents_delete(&api, id, yes).await,
            DocumentsCommand::Download {
                id,
                original,
                output,
            } => cmd_documents_download(&api, id, original, output).await,
            DocumentsCommand::Upload {
                file,
                title,
                tags,
                correspondent,
                document_type,
                no_wait,
            } => {
                let upload = Upload {
                    file,
                    title,
                    tags,
                    correspondent,
                    document_type,
                    no_wait,
                };
                cmd_documents_upload(&api, upload, json).await
            }
            DocumentsCommand::BulkTag { ids, add, remove } => {
                cmd_documents_bulk_tag(&api, ids, add, remove).await
            }
        },
        Command::Correspondents { command } => match command {
            CorrespondentsCommand::List => cmd_correspondents_list(&api, json).await,
        },
        Command::DocumentTypes { command } => match command {
            DocumentTypesCommand::List => cmd_document_types_list(&api, json).await,
        },
        Command::Tasks { command } => match command {
            TasksCommand::Wait { task_id } => cmd_tasks_wait(&api, task_id, json).await,
        },
    }
}

async fn cmd_tags_list(api: &PaperlessApi, json: bool) -> Result<()> {
    let tags = api.get_tags().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
        return Ok(());
    }
    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = tags
        .iter()
        .map(|tag| {
            vec![
                tag.id.to_string(),
                tag.name.clone(),
                tag.color.clone().unwrap_or_else(|| "-".to_string()),
                if tag.is_inbox_tag { "yes" } else { "-" }.to_string(),
                tag.document_count.to_string(),
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(&["ID", "Name", "Color", "Inbox", "Documents"], &rows)
    );
    Ok(())
}

async fn cmd_tags_create(
    api: &PaperlessApi,
    name: String,
    color: Option<String>,
    inbox: bool,
    json: bool,
) -> Result<()> {
    let tag = api
        .create_tag(&TagCreate {
            name,
            color,
            is_inbox_tag: inbox,
        })
        .await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tag)?);
    } else {
        println!("Created tag {:?} with id {}", tag.name, tag.id);
    }
    Ok(())
}

async fn cmd_tags_delete(api: &PaperlessApi, id: u64, yes: bool) -> Result<()> {
    if !yes {
        let tag = api.get_tag(id).await?;
        if !confirm(&format!("Delete tag {:?} (id {id})?", tag.name))? {
            println!("Cancelled.");
            return Ok(());
        }
    }
    api.delete_tag(id).await?;
    println!("Deleted tag {id}");
    Ok(())
}

async fn cmd_documents_search(
    api: &PaperlessApi,
    query: Option<String>,
    tags: Vec<String>,
    page: u32,
    page_size: u32,
    ordering: Option<String>,
    json: bool,
) -> Result<()> {
    let mut search = DocumentSearch {
        query,
        page,
        page_size,
        ordering,
        ..DocumentSearch::default()
    };
    if !tags.is_empty() {
        search.tag_ids = api.resolve_tag_ids(&tags).await?;
    }

    let result = api.search_documents(&search).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if result.results.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    // One lookup for the whole page instead of one per document.
    let tag_names = tag_names_by_id(api).await?;
    let correspondents: HashMap<u64, String> = api
        .get_correspondents()
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let rows: Vec<Vec<String>> = result
        .results
        .iter()
        .map(|doc| {
            let tag_list: Vec<String> = doc
                .tags
                .iter()
                .map(|id| {
                    tag_names
                        .get(id)
                        .cloned()
                        .unwrap_or_else(|| id.to_string())
                })
                .collect();
            vec![
                doc.id.to_string(),
                doc.title.clone(),
                doc.correspondent
                    .and_then(|id| correspondents.get(&id).cloned())
                    .unwrap_or_else(|| "-".to_string()),
                doc.created_date().to_string(),
                if tag_list.is_empty() {
                    "-".to_string()
                } else {
                    tag_list.join(", ")
                },
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(&["ID", "Title", "Correspondent", "Created", "Tags"], &rows)
    );

    if result.count > u64::from(page_size) {
        let pages = result.count.div_ceil(u64::from(page_size));
        println!();
        println!("Page {page} of {pages}, {} documents in total", result.count);
    }
    Ok(())
}

async fn cmd_documents_show(api: &PaperlessApi, id: u64, metadata: bool, json: bool) -> Result<()> {
    if metadata {
        let metadata = api.get_document_metadata(id).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        } else {
            match metadata.as_object() {
                Some(map) => {
                    for (key, value) in map {
                        println!("{key}: {value}");
                    }
                }
                None => println!("{metadata}"),
            }
        }
        return Ok(());
    }

    let document = api.get_document(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("Title:         {}", document.title);
    println!("Created:       {}", document.created);
    if let Some(added) = &document.added {
        println!("Added:         {added}");
    }
    if let Some(modified) = &document.modified {
        println!("Modified:      {modified}");
    }
    println!(
        "Original file: {}",
        document.original_file_name.as_deref().unwrap_or("-")
    );
    if let Some(asn) = document.archive_serial_number {
        println!("ASN:           {asn}");
    }
    if let Some(correspondent_id) = document.correspondent {
        let correspondent = api.get_correspondent(correspondent_id).await?;
        println!("Correspondent: {}", correspondent.name);
    }
    if let Some(type_id) = document.document_type {
        let document_type = api.get_document_type(type_id).await?;
        println!("Document type: {}", document_type.name);
    }
    if !document.tags.is_empty() {
        let tag_names = tag_names_by_id(api).await?;
        let list: Vec<String> = document
            .tags
            .iter()
            .map(|id| tag_names.get(id).cloned().unwrap_or_else(|| id.to_string()))
            .collect();
        println!("Tags:          {}", list.join(", "));
    }
    if !document.content.is_empty() {
        let preview: String = document.content.chars().take(500).collect();
        let truncated = preview.len() < document.content.len();
        println!();
        println!("Content preview:");
        println!("{preview}{}", if truncated { "..." } else { "" });
    }
    Ok(())
}

/// Collected `documents update` options.
struct Update {
    title: Option<String>,
    correspondent: Option<u64>,
    document_type: Option<u64>,
    add_tags: Vec<String>,
    remove_tags: Vec<String>,
    set_tags: Option<Vec<String>>,
}

async fn cmd_documents_update(
    api: &PaperlessApi,
    id: u64,
    options: Update,
    json: bool,
) -> Result<()> {
    let mut update = DocumentUpdate {
        title: options.title,
        correspondent: options.correspondent,
        document_type: options.document_type,
        tags: None,
    };

    if let Some(set_tags) = &options.set_tags {
        update.tags = Some(api.resolve_tag_ids(set_tags).await?);
    } else if !options.add_tags.is_empty() || !options.remove_tags.is_empty() {
        let document = api.get_document(id).await?;
        let mut tags = document.tags;
        if !options.add_tags.is_empty() {
            for tag in api.resolve_tag_ids(&options.add_tags).await? {
                if !tags.contains(&tag) {
                    tags.push(tag);
                }
            }
        }
        if !options.remove_tags.is_empty() {
            let remove = api.resolve_tag_ids(&options.remove_tags).await?;
            tags.retain(|tag| !remove.contains(tag));
        }
        update.tags = Some(tags);
    }

    if update.title.is_none()
        && update.correspondent.is_none()
        && update.document_type.is_none()
        && update.tags.is_none()
    {
        bail!("nothing to update; pass --title, --correspondent, --document-type or a tag option");
    }

    let changed_tags = update.tags.is_some();
    let document = api.update_document(id, &update).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }
    println!("Updated document {} ({})", document.id, document.title);
    if changed_tags {
        let tag_names = tag_names_by_id(api).await?;
        let list: Vec<String> = document
            .tags
            .iter()
            .map(|id| tag_names.get(id).cloned().unwrap_or_else(|| id.to_string()))
            .collect();
        println!(
            "Tags: {}",
            if list.is_empty() {
                "none".to_string()
            } else {
                list.join(", ")
            }
        );
    }
    Ok(())
}

async fn cmd_documents_delete(api: &PaperlessApi, id: u64, yes: bool) -> Result<()> {
    if !yes {
        let document = api.get_document(id).await?;
        if !confirm(&format!(
            "Delete document {:?} (id {id})?",
            document.title
        ))? {
            println!("Cancelled.");
            return Ok(());
        }
    }
    api.delete_document(id).await?;
    println!("Deleted document {id}");
    Ok(())
}

async fn cmd_documents_download(
    api: &PaperlessApi,
    id: u64,
    original: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let (bytes, suggested) = api.download_document(id, original).await?;
    let path = match output {
        Some(path) => path,
        None => {
            let name = match suggested {
                Some(name) => name,
                None => {
                    let document = api.get_document(id).await?;
                    document
                        .original_file_name
                        .unwrap_or_else(|| format!("document-{id}.pdf"))
                }
            };
            PathBuf::from(name)
        }
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Downloaded document {id} to {}", path.display());
    Ok(())
}

/// Collected `documents upload` options.
struct Upload {
    file: PathBuf,
    title: Option<String>,
    tags: Vec<String>,
    correspondent: Option<u64>,
    document_type: Option<u64>,
    no_wait: bool,
}

async fn cmd_documents_upload(api: &PaperlessApi, options: Upload, json: bool) -> Result<()> {
    let bytes = std::fs::read(&options.file)
        .with_context(|| format!("failed to read {}", options.file.display()))?;
    let file_name = options
        .file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let tags = if options.tags.is_empty() {
        Vec::new()
    } else {
        api.resolve_tag_ids(&options.tags).await?
    };

    let task_id = api
        .upload_document(DocumentUpload {
            file_name,
            bytes,
            title: options.title,
            tags,
            correspondent: options.correspondent,
            document_type: options.document_type,
        })
        .await?;

    if options.no_wait {
        println!("Upload accepted, task {task_id}");
        return Ok(());
    }
    info!("Upload accepted, waiting for task {task_id}");
    let task = api.wait_for_task(&task_id, POLL_INTERVAL).await?;
    print_finished_task(&task, json)
}

async fn cmd_documents_bulk_tag(
    api: &PaperlessApi,
    ids: Vec<u64>,
    add: Option<String>,
    remove: Option<String>,
) -> Result<()> {
    let (name, bulk_method) = match (add, remove) {
        (Some(name), None) => (name, BulkEditMethod::AddTag),
        (None, Some(name)) => (name, BulkEditMethod::RemoveTag),
        _ => bail!("pass exactly one of --add or --remove"),
    };
    let tag = match api.resolve_tag_ids(&[name.clone()]).await?.first() {
        Some(id) => *id,
        None => bail!("tag {name:?} did not resolve to an id"),
    };

    api.bulk_edit(&ids, bulk_method, serde_json::json!({ "tag": tag }))
        .await?;
    match bulk_method {
        BulkEditMethod::AddTag => println!("Added {name:?} to {} documents", ids.len()),
        _ => println!("Removed {name:?} from {} documents", ids.len()),
    }
    Ok(())
}

async fn cmd_correspondents_list(api: &PaperlessApi, json: bool) -> Result<()> {
    let correspondents = api.get_correspondents().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&correspondents)?);
        return Ok(());
    }
    if correspondents.is_empty() {
        println!("No correspondents found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = correspondents
        .iter()
        .map(|correspondent| {
            vec![
                correspondent.id.to_string(),
                correspondent.name.clone(),
                correspondent.document_count.to_string(),
                correspondent
                    .last_correspondence
                    .as_deref()
                    .map(|date| date.split('T').next().unwrap_or(date).to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    print!(
        "{}",
        tables::render(&["ID", "Name", "Documents", "Last correspondence"], &rows)
    );
    Ok(())
}

async fn cmd_document_types_list(api: &PaperlessApi, json: bool) -> Result<()> {
    let document_types = api.get_document_types().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&document_types)?);
        return Ok(());
    }
    if document_types.is_empty() {
        println!("No document types found.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = document_types
        .iter()
        .map(|document_type| {
            vec![
                document_type.id.to_string(),
                document_type.name.clone(),
                document_type.document_count.to_string(),
            ]
        })
        .collect();
    print!("{}", tables::render(&["ID", "Name", "Documents"], &rows));
    Ok(())
}

async fn cmd_tasks_wait(api: &PaperlessApi, task_id: String, json: bool) -> Result<()> {
    let task = api.wait_for_task(&task_id, POLL_INTERVAL).await?;
    print_finished_task(&task, json)
}

fn print_finished_task(task: &Task, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
        return Ok(());
    }
    match task.document_id() {
        Some(document_id) => println!("Document consumed as id {document_id}"),
        None => println!("Task finished"),
    }
    if let Some(result) = &task.result {
        println!("{result}");
    }
    Ok(())
}

async fn tag_names_by_id(api: &PaperlessApi) -> Result<HashMap<u64, String>> {
    Ok(api
        .get_tags()
        .await?
        .into_iter()
        .map(|tag| (tag.id, tag.name))
        .collect())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush().context("failed to flush stdout")?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("failed to read the confirmation")?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
