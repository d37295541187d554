// code-chat-markdown - Chat transcript markdown rendering for the terminal
// Copyright (C) 2025  Simon Peter Rothgang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use super::App;
use crate::apply::{ApplyEditor, Clipboard};
use crate::codespan::LinkLookup;
use crate::error::AppError;
use crate::markdown::ChatMarkdownRenderer;
use crate::markdown::node::CodeBlock;
use crate::nav::{self, Navigator};

/// Picks a code block of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSelector {
    /// 1-based position in display order.
    Index(usize),
    ApplyBoxId(String),
}

impl BlockSelector {
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::ApplyBoxId(text.trim().to_owned()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::ApplyBoxId(id) => id.clone(),
        }
    }
}

impl App {
    pub fn code_blocks(&self) -> Vec<CodeBlock> {
        let renderer = ChatMarkdownRenderer::new(&self.languages)
            .with_links(&self.links)
            .with_workspace_root(&self.workspace_root);
        self.transcript.code_blocks(&renderer, self.settings.render_options())
    }

    pub fn find_code_block(&self, selector: &BlockSelector) -> Result<CodeBlock, AppError> {
        let blocks = self.code_blocks();
        let found = match selector {
            BlockSelector::Index(index) => {
                index.checked_sub(1).and_then(|i| blocks.into_iter().nth(i))
            }
            BlockSelector::ApplyBoxId(id) => blocks.into_iter().find(|block| {
                block.controls.as_ref().is_some_and(|controls| controls.apply_box_id == *id)
            }),
        };
        found.ok_or_else(|| AppError::CodeBlockNotFound(selector.describe()))
    }

    /// Copy is offered for every block, streaming or not.
    pub fn copy_block(
        &mut self,
        selector: &BlockSelector,
        clipboard: &mut dyn Clipboard,
    ) -> Result<(), AppError> {
        let block = self.find_code_block(selector)?;
        let result = match &block.controls {
            Some(controls) => self.apply_states.copy(controls, clipboard),
            None => clipboard.set_text(&block.code),
        };
        result.map_err(|e| AppError::ApplyFailed(e.to_string()))?;
        tracing::info!(block = %selector.describe(), "copied code block");
        Ok(())
    }

    pub fn apply_block(
        &mut self,
        selector: &BlockSelector,
        editor: &mut dyn ApplyEditor,
    ) -> Result<(), AppError> {
        let block = self.find_code_block(selector)?;
        let Some(controls) = &block.controls else {
            return Err(AppError::ApplyFailed("apply controls are disabled".to_owned()));
        };
        self.apply_states.apply(controls, editor).map_err(|e| AppError::ApplyFailed(e.to_string()))
    }

    /// Open the resolved location of code span `text` of this thread.
    pub fn open_codespan(&self, text: &str, navigator: &mut dyn Navigator) -> Result<(), AppError> {
        let LinkLookup::Resolved(link) = self.links.lookup(self.transcript.thread_id(), text) else {
            return Err(AppError::CodespanUnresolved(text.to_owned()));
        };
        match nav::open_link(&link, navigator) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::CodespanUnresolved(text.to_owned())),
            Err(err) => Err(AppError::OpenFailed(format!("{err:#}"))),
        }
    }
}
