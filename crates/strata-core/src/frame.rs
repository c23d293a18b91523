//! Frame arena for one render chain.
//!
//! Every template rendered in an extends chain gets a frame. A frame records the
//! blocks its template declared while extending, plus the frame that was current
//! when it was created. Frames live in a `Vec` and are addressed by [`FrameId`];
//! "current" is an explicit index that block resolution saves and restores.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::context::TemplateContext;
use crate::error::RenderResult;

/// Content callback for a block. Invoked with the context of the render that uses it.
pub type BlockProvider = Rc<dyn Fn(&mut TemplateContext<'_>) -> RenderResult<String>>;

/// Index of a frame in a [`FrameStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(usize);

impl FrameId {
    /// Position of the frame in its arena.
    pub fn index(self) -> usize {
        self.0
    }
}

struct Frame {
    blocks: HashMap<String, BlockProvider>,
    parent: Option<FrameId>,
}

/// Arena of render frames plus the index of the current one.
#[derive(Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
    current: Option<FrameId>,
}

impl fmt::Debug for FrameStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frames: Vec<_> = self
            .frames
            .iter()
            .map(|frame| (frame.parent, frame.blocks.keys().collect::<Vec<_>>()))
            .collect();
        f.debug_struct("FrameStack")
            .field("frames", &frames)
            .field("current", &self.current)
            .finish()
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a frame whose parent is the current frame and make it current.
    pub fn create_frame(&mut self) -> FrameId {
        let id = FrameId(self.frames.len());
        self.frames.push(Frame {
            blocks: HashMap::new(),
            parent: self.current,
        });
        self.current = Some(id);
        tracing::trace!(frame = id.0, parent = ?self.parent_of(id), "Created render frame");
        id
    }

    /// The frame block instructions currently resolve from, if any.
    pub fn current(&self) -> Option<FrameId> {
        self.current
    }

    /// Replace the current frame, returning the one it replaced.
    pub fn set_current(&mut self, frame: Option<FrameId>) -> Option<FrameId> {
        std::mem::replace(&mut self.current, frame)
    }

    /// The frame that was current when `frame` was created.
    pub fn parent_of(&self, frame: FrameId) -> Option<FrameId> {
        self.frames.get(frame.0).and_then(|f| f.parent)
    }

    /// Number of frames created so far.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Record a block declaration in `frame`. Returns `true` when it replaced an
    /// earlier declaration of the same name in that frame. Frames from another
    /// stack are ignored.
    pub fn declare(&mut self, frame: FrameId, name: &str, provider: BlockProvider) -> bool {
        self.frames
            .get_mut(frame.0)
            .is_some_and(|f| f.blocks.insert(name.to_string(), provider).is_some())
    }

    /// Find the nearest frame, starting at `from` and following parent links,
    /// that declares `name`.
    pub fn find_declaring(&self, name: &str, from: FrameId) -> Option<(FrameId, BlockProvider)> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let frame = self.frames.get(id.0)?;
            if let Some(provider) = frame.blocks.get(name) {
                return Some((id, Rc::clone(provider)));
            }
            cursor = frame.parent;
        }
        None
    }

    /// Names declared by `frame`, sorted.
    pub fn declared_blocks(&self, frame: FrameId) -> Vec<String> {
        let mut names: Vec<String> = self
            .frames
            .get(frame.0)
            .map(|f| f.blocks.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}
