use crate::carousel::gesture::{PointerId, PointerKind};
use crate::carousel::mount::MountPoll;
use crate::carousel::scheduler::{Clock, FrameTicket};
use crate::carousel::{CursorShape, GestureResponse, Point};
use crate::config::{self, Config};
use crate::embed::ResizeMessage;
use crate::events::AppEvent;
use crate::gui::stage::{self, State, WHEEL_STEP};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window::{self, GlibClock};
use crate::sys::server::HeightFeed;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

const TYPEWRITER_TICK: Duration = Duration::from_millis(40);

pub struct AppModel {
    pub state: Rc<RefCell<State>>,
    pub visible: bool,
    pub headline: String,
    pub hint: String,
    pub feed: HeightFeed,
    pub drawing_area: gtk::DrawingArea,
    pub drag: gtk::GestureDrag,
    pointer: PointerId,
    tick: Option<gtk::TickCallbackId>,
    typewriter: Option<glib::SourceId>,
    clock: GlibClock,
}

#[derive(Debug)]
pub enum AppMsg {
    Show,
    Hide,
    ConfigReload,
    MountPoll,
    Resize(i32, i32),
    DragBegin(Point, PointerKind),
    DragUpdate(Point),
    DragEnd,
    DragCancel,
    Wheel(f64),
    Frame(FrameTicket),
    TypewriterTick,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Show => AppMsg::Show,
            AppEvent::Hide => AppMsg::Hide,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (Config, async_channel::Receiver<AppEvent>, HeightFeed);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("swipespin"),
            #[watch]
            set_visible: model.visible,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Hide);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            gtk::ScrolledWindow {
                set_hscrollbar_policy: gtk::PolicyType::Never,

                gtk::Box {
                    set_orientation: gtk::Orientation::Vertical,

                    gtk::Label {
                        add_css_class: "swipespin-headline",
                        #[watch]
                        set_label: &model.headline,
                    },

                    gtk::Label {
                        add_css_class: "swipespin-hint",
                        #[watch]
                        set_label: &model.hint,
                    },

                    #[name = "drawing_area"]
                    gtk::DrawingArea {
                        set_hexpand: true,
                        set_vexpand: true,
                        add_css_class: "swipespin-stage",
                        set_cursor_from_name: Some("grab"),

                        connect_resize[sender] => move |_, w, h| {
                            sender.input(AppMsg::Resize(w, h));
                        },

                        #[name = "drag"]
                        add_controller = gtk::GestureDrag {
                            set_button: gtk::gdk::BUTTON_PRIMARY,
                            connect_drag_begin[sender] => move |gesture, x, y| {
                                let kind = window::pointer_kind(gesture.current_event_device());
                                sender.input(AppMsg::DragBegin(Point::new(x, y), kind));
                            },
                            connect_drag_update[sender] => move |gesture, dx, dy| {
                                if let Some((x, y)) = gesture.start_point() {
                                    sender.input(AppMsg::DragUpdate(Point::new(x + dx, y + dy)));
                                }
                            },
                            connect_drag_end[sender] => move |_, _, _| {
                                sender.input(AppMsg::DragEnd);
                            },
                            connect_cancel[sender] => move |_, _| {
                                sender.input(AppMsg::DragCancel);
                            },
                        },
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, rx, feed) = init;

        theme::load_css();
        window::apply_embed_size(&root, &config.embed);

        let clock = GlibClock;
        let hint = config.page.hint.clone();
        let state = Rc::new(RefCell::new(State::new(config, clock.now_ms())));

        let model = AppModel {
            state: state.clone(),
            visible: true,
            headline: String::new(),
            hint,
            feed,
            drawing_area: gtk::DrawingArea::default(),
            drag: gtk::GestureDrag::default(),
            pointer: PointerId(0),
            tick: None,
            typewriter: None,
            clock,
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.drag = widgets.drag.clone();

        let state_draw = model.state.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                if let Err(e) = stage::draw(cr, &state_draw.borrow(), &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let scroll = gtk::EventControllerScroll::new(gtk::EventControllerScrollFlags::VERTICAL);
        let state_scroll = model.state.clone();
        let sender_scroll = sender.clone();
        scroll.connect_scroll(move |controller, _, dy| {
            // page scrolling keeps the wheel when the carousel does not take it
            if !state_scroll.borrow().wheel_enabled() {
                return glib::Propagation::Proceed;
            }
            let delta = match controller.unit() {
                gtk::gdk::ScrollUnit::Wheel => dy * WHEEL_STEP,
                _ => dy,
            };
            sender_scroll.input(AppMsg::Wheel(delta));
            glib::Propagation::Stop
        });
        widgets.drawing_area.add_controller(scroll);

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        model.start_mount(&sender);
        model.start_typewriter(&sender);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        let now = self.clock.now_ms();
        match msg {
            AppMsg::Show => {
                self.visible = true;
            }
            AppMsg::Hide => {
                self.visible = false;
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    self.stop_frames();
                    self.hint = new_config.page.hint.clone();
                    self.state.borrow_mut().reload(new_config, now);
                    self.start_mount(&sender);
                    self.start_typewriter(&sender);
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
            AppMsg::MountPoll => {
                let width = self.drawing_area.width() as f64;
                let (poll, report) = self.state.borrow_mut().mount(Some(width));
                match poll {
                    MountPoll::Waiting { .. } => self.start_mount(&sender),
                    MountPoll::Missing => {}
                    MountPoll::Ready { .. } | MountPoll::Forced { .. } => {
                        self.publish(report);
                        self.drawing_area.queue_draw();
                    }
                }
            }
            AppMsg::Resize(w, h) => {
                let scale = self.drawing_area.scale_factor() as f64;
                let report = self
                    .state
                    .borrow_mut()
                    .resize(w as f64, h as f64, scale);
                self.publish(report);
                self.drawing_area.queue_draw();
            }
            AppMsg::DragBegin(pos, kind) => {
                self.pointer = PointerId(self.pointer.0 + 1);
                let response = self
                    .with_carousel(|c| c.pointer_down(self.pointer, pos, kind, true, now));
                self.apply(response);
            }
            AppMsg::DragUpdate(pos) => {
                let pointer = self.pointer;
                let response = self.with_carousel(|c| c.pointer_move(pointer, pos, now));
                if response.lock_scroll || response.capture_pointer {
                    self.drag.set_state(gtk::EventSequenceState::Claimed);
                } else if !self.with_carousel(|c| c.has_gesture()) {
                    // vertical movement: let the scrolled window have it
                    self.drag.set_state(gtk::EventSequenceState::Denied);
                }
                self.apply(response);
            }
            AppMsg::DragEnd => {
                let pointer = self.pointer;
                let response = self.with_carousel(|c| c.pointer_up(pointer, now));
                self.apply(response);
            }
            AppMsg::DragCancel => {
                let pointer = self.pointer;
                let response = self.with_carousel(|c| c.pointer_cancel(pointer, now));
                self.apply(response);
            }
            AppMsg::Wheel(delta) => {
                let response = self.with_carousel(|c| c.wheel(delta, now));
                self.apply(response);
            }
            AppMsg::Frame(ticket) => {
                self.tick = None;
                let outcome = self.with_carousel(|c| c.frame(ticket, now));
                let report = self.state.borrow_mut().absorb(outcome.resized);
                self.publish(report);
                if outcome.relayout {
                    self.drawing_area.queue_draw();
                }
            }
            AppMsg::TypewriterTick => {
                let state = self.state.borrow();
                let frame = state.headline.frame(now);
                self.headline = if frame.cursor {
                    format!("{}|", frame.text)
                } else {
                    frame.text.to_string()
                };
                if state.headline.is_finished(now)
                    && let Some(id) = self.typewriter.take()
                {
                    id.remove();
                }
            }
        }
        self.schedule_frame(&sender);
    }
}

impl AppModel {
    fn with_carousel<T: Default>(&self, f: impl FnOnce(&mut crate::carousel::Carousel) -> T) -> T {
        self.state
            .borrow_mut()
            .carousel
            .as_mut()
            .map(f)
            .unwrap_or_default()
    }

    fn apply(&mut self, response: GestureResponse) {
        if let Some(cursor) = response.cursor {
            let name = match cursor {
                CursorShape::Grab => "grab",
                CursorShape::Grabbing => "grabbing",
            };
            self.drawing_area.set_cursor_from_name(Some(name));
        }
        let report = self.state.borrow_mut().absorb(response.resized);
        self.publish(report);
        if response.relayout {
            self.drawing_area.queue_draw();
        }
    }

    fn publish(&self, report: Option<ResizeMessage>) {
        if let Some(msg) = report {
            self.drawing_area.set_content_height(msg.height.ceil() as i32);
            self.feed.publish(msg);
        }
    }

    fn start_mount(&self, sender: &ComponentSender<Self>) {
        let sender = sender.clone();
        self.drawing_area.add_tick_callback(move |_, _| {
            sender.input(AppMsg::MountPoll);
            glib::ControlFlow::Break
        });
    }

    fn start_typewriter(&mut self, sender: &ComponentSender<Self>) {
        if let Some(id) = self.typewriter.take() {
            id.remove();
        }
        let sender = sender.clone();
        self.typewriter = Some(glib::timeout_add_local(TYPEWRITER_TICK, move || {
            sender.input(AppMsg::TypewriterTick);
            glib::ControlFlow::Continue
        }));
    }

    fn schedule_frame(&mut self, sender: &ComponentSender<Self>) {
        let Some(ticket) = self.state.borrow_mut().take_frame_request() else {
            return;
        };
        self.stop_frames();
        let sender = sender.clone();
        self.tick = Some(self.drawing_area.add_tick_callback(move |_, _| {
            sender.input(AppMsg::Frame(ticket));
            glib::ControlFlow::Break
        }));
    }

    fn stop_frames(&mut self) {
        if let Some(id) = self.tick.take() {
            id.remove();
        }
    }
}
