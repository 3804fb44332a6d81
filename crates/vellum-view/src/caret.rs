//! Blinking caret and selection anchor.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use vellum_content::{Bias, Content, ContentError, TextPosition};
use vellum_document::{DocumentEvents, Subscription, TextDocument};
use vellum_draw::{DrawingService, Point};

use crate::doc_view::DocumentView;

struct CaretInner {
    content: Content,
    /// Selection anchor; `None` means no active selection.
    start: Option<TextPosition>,
    /// The blinking edit point; always present.
    end: TextPosition,
    /// Half-period of the blink cycle, in seconds.
    blink_period: f32,
    blink_t: f32,
}

/// Cursor + optional selection anchor over one document.
///
/// Both ends are tracked positions, so they ride along with every edit; the
/// anchor is `Forward`-biased and the edit point `Backward`-biased, which
/// keeps a selection stable around insertions at its edges. Whenever a
/// document modification makes the two coincide, the anchor is dropped and
/// the selection auto-collapses.
pub struct Caret {
    inner: Rc<RefCell<CaretInner>>,
    events: DocumentEvents,
    sub: Option<Subscription>,
}

impl Caret {
    pub fn new(doc: &TextDocument) -> Result<Self, ContentError> {
        Self::with_blink_interval(doc, 0.5)
    }

    pub fn with_blink_interval(doc: &TextDocument, period: f32) -> Result<Self, ContentError> {
        let content = doc.content().clone();
        let end = content.create_position(0, Bias::Backward)?;
        let inner = Rc::new(RefCell::new(CaretInner {
            content,
            start: None,
            end,
            blink_period: period.max(f32::MIN_POSITIVE),
            blink_t: 0.0,
        }));
        let weak: Weak<RefCell<CaretInner>> = Rc::downgrade(&inner);
        let sub = doc.events().modified().subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.borrow_mut();
                let collapsed = inner
                    .start
                    .as_ref()
                    .is_some_and(|s| s.offset() == inner.end.offset());
                if collapsed {
                    inner.start = None;
                }
            }
        });
        Ok(Self {
            inner,
            events: doc.events().clone(),
            sub: Some(sub),
        })
    }

    /// Current edit-point offset.
    pub fn offset(&self) -> usize {
        self.inner.borrow().end.offset()
    }

    pub fn has_selection(&self) -> bool {
        self.inner.borrow().start.is_some()
    }

    pub fn selection_start_offset(&self) -> usize {
        let inner = self.inner.borrow();
        inner
            .start
            .as_ref()
            .map_or_else(|| inner.end.offset(), TextPosition::offset)
    }

    pub fn selection_end_offset(&self) -> usize {
        self.inner.borrow().end.offset()
    }

    /// Normalized selection span, `None` without an active selection.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let inner = self.inner.borrow();
        let anchor = inner.start.as_ref()?.offset();
        let end = inner.end.offset();
        Some((anchor.min(end), anchor.max(end)))
    }

    /// Collapse any selection and move the edit point.
    pub fn move_to(&self, offset: usize) -> Result<(), ContentError> {
        let mut inner = self.inner.borrow_mut();
        inner.start = None;
        inner.end = inner.content.create_position(offset, Bias::Backward)?;
        Ok(())
    }

    /// Extend (or begin) a selection: the first call anchors at the current
    /// edit point, then the edit point moves.
    pub fn select(&self, offset: usize) -> Result<(), ContentError> {
        let mut inner = self.inner.borrow_mut();
        if inner.start.is_none() {
            let anchor = inner.content.create_position(inner.end.offset(), Bias::Forward)?;
            inner.start = Some(anchor);
        }
        inner.end = inner.content.create_position(offset, Bias::Backward)?;
        Ok(())
    }

    /// Advance the blink timer. The loop is independent of edit state.
    pub fn advance(&self, dt: f32) {
        let mut inner = self.inner.borrow_mut();
        let cycle = inner.blink_period * 2.0;
        inner.blink_t = (inner.blink_t + dt) % cycle;
    }

    /// Positive during the visible half of the blink cycle.
    pub fn blink_phase(&self) -> f32 {
        let inner = self.inner.borrow();
        inner.blink_period - inner.blink_t
    }

    pub fn is_visible(&self) -> bool {
        self.blink_phase() > 0.0
    }

    /// Paint the selection highlight and, when the blink phase allows, the
    /// caret line, using the view's offset↔rectangle mapping.
    pub fn draw(&self, view: &DocumentView, svc: &mut dyn DrawingService) {
        let style = view.style().clone();
        if let Some((start, end)) = self.selection_range()
            && start < end
        {
            for rect in view.selection_rects(start, end) {
                svc.fill_rect(rect, style.selection_color());
            }
        }
        if self.is_visible()
            && let Some(rect) = view.model_to_view(self.offset())
        {
            svc.draw_line(
                Point::new(rect.x, rect.y),
                Point::new(rect.x, rect.y + rect.height),
                1.0,
                style.caret_color(),
            );
        }
    }
}

impl Drop for Caret {
    fn drop(&mut self) {
        if let Some(sub) = self.sub.take() {
            self.events.modified().unsubscribe(sub);
        }
    }
}
