mod helpers;

mod app_flow;
mod code_blocks;
mod codespan_links;
mod rendering;
mod token_paths;
