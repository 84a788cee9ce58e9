//! # Catalog
//!
//! The API served by `warren-server`: instances, their volumes and images, kept in an
//! in-memory [`Store`]. It exercises every declaration form the compiler offers:
//! standard operations, member actions, a nested subcollection, a feature, a
//! capability requirement and a dynamic gate.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use warren::domain::config::RoutingConfig;
use warren::prelude::*;

pub const APP_NAME: &str = "catalog";

/// Capability required to create or destroy images.
pub const MANAGE_IMAGES: &str = "manage_images";

pub const ARCHITECTURES: [&str; 2] = ["x86_64", "i386"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub arch: String,
    pub owner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub image_id: String,
    pub state: InstanceState,
    pub volumes: Vec<String>,
}

#[derive(Debug, Default)]
struct StoreInner {
    images: RwLock<BTreeMap<String, Image>>,
    instances: RwLock<BTreeMap<String, Instance>>,
    sequence: AtomicU64,
    maintenance: AtomicBool,
}

/// Shared in-memory state behind the catalog operations.
#[derive(Debug, Clone, Default)]
pub struct Store(Arc<StoreInner>);

impl Store {
    /// Two images and one running instance.
    #[must_use]
    pub fn seeded() -> Self {
        let store = Self::default();
        store.insert_image("fedora", "x86_64", "alice");
        let debian = store.insert_image("debian", "i386", "bob");
        store.insert_instance(&debian.id);
        store
    }

    #[must_use]
    pub fn images(&self) -> Vec<Image> {
        self.0.images.read().values().cloned().collect()
    }

    #[must_use]
    pub fn image(&self, id: &str) -> Option<Image> {
        self.0.images.read().get(id).cloned()
    }

    pub fn insert_image(&self, name: &str, arch: &str, owner: &str) -> Image {
        let image = Image {
            id: self.next_id("img"),
            name: name.to_owned(),
            arch: arch.to_owned(),
            owner: owner.to_owned(),
        };
        self.0.images.write().insert(image.id.clone(), image.clone());
        image
    }

    #[must_use]
    pub fn instances(&self) -> Vec<Instance> {
        self.0.instances.read().values().cloned().collect()
    }

    #[must_use]
    pub fn instance(&self, id: &str) -> Option<Instance> {
        self.0.instances.read().get(id).cloned()
    }

    pub fn insert_instance(&self, image_id: &str) -> Instance {
        let instance = Instance {
            id: self.next_id("inst"),
            image_id: image_id.to_owned(),
            state: InstanceState::Running,
            volumes: vec![self.next_id("vol")],
        };
        self.0.instances.write().insert(instance.id.clone(), instance.clone());
        instance
    }

    /// While on, the `reboot` action answers `404`.
    pub fn set_maintenance(&self, enabled: bool) {
        self.0.maintenance.store(enabled, Ordering::Relaxed);
    }

    #[must_use]
    pub fn in_maintenance(&self) -> bool {
        self.0.maintenance.load(Ordering::Relaxed)
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.0.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{n}")
    }

    fn remove_image(&self, id: &str) -> Option<Image> {
        self.0.images.write().remove(id)
    }

    fn remove_instance(&self, id: &str) -> Option<Instance> {
        self.0.instances.write().remove(id)
    }

    fn set_state(&self, id: &str, state: InstanceState) -> Option<Instance> {
        let mut instances = self.0.instances.write();
        let instance = instances.get_mut(id)?;
        instance.state = state;
        Some(instance.clone())
    }
}

fn not_found(kind: &str, id: &str) -> Reply {
    Reply::text(404, format!("{kind} '{id}' not found"))
}

fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Reply, ControlError> {
    Ok(Reply::json(status, value)?)
}

fn input<'a>(inputs: &'a Inputs, name: &str) -> &'a str {
    inputs.get(name).map_or("", String::as_str)
}

/// Declares and compiles the catalog API.
///
/// # Errors
/// Returns a [`DeclarationError`] if the declarations conflict under `routing`.
pub fn api(routing: RoutingConfig, hooks: Hooks, store: &Store) -> Result<Api, DeclarationError> {
    Api::builder(APP_NAME)
        .routing(routing)
        .hooks(hooks)
        .feature("owner_filter", "images", |f| {
            f.description("Filter images by owner")
                .operation("index", [ParameterSchema::string("owner_id").describe("Owner login")])
                .constraint("max_length", 64);
        })
        .collection("images", |c| images(c, store))
        .collection("instances", |c| instances(c, store))
        .build()
}

fn images(c: &mut CollectionBuilder, store: &Store) {
    c.description("Machine images instances are launched from")
        .operation("index", |o| {
            let store = store.clone();
            o.description("List images")
                .param(ParameterSchema::enumeration("arch", ARCHITECTURES).describe("Architecture"))
                .control(move |inputs: Inputs| {
                    let store = store.clone();
                    async move {
                        let images: Vec<_> = store
                            .images()
                            .into_iter()
                            .filter(|i| inputs.get("arch").is_none_or(|arch| &i.arch == arch))
                            .filter(|i| inputs.get("owner_id").is_none_or(|owner| &i.owner == owner))
                            .collect();
                        json(200, &images)
                    }
                });
        })
        .operation("show", |o| {
            let store = store.clone();
            o.description("Image details").control(move |inputs: Inputs| {
                let store = store.clone();
                async move {
                    let id = input(&inputs, "id");
                    match store.image(id) {
                        Some(image) => json(200, &image),
                        None => Ok(not_found("Image", id)),
                    }
                }
            });
        })
        .operation("create", |o| {
            let store = store.clone();
            o.description("Register an image")
                .param(ParameterSchema::string("name").required().describe("Image name"))
                .param(ParameterSchema::enumeration("arch", ARCHITECTURES).required())
                .param(ParameterSchema::string("owner").describe("Owner login"))
                .with_capability(MANAGE_IMAGES)
                .control(move |inputs: Inputs| {
                    let store = store.clone();
                    async move {
                        let owner = inputs.get("owner").map_or("anonymous", String::as_str);
                        let image =
                            store.insert_image(input(&inputs, "name"), input(&inputs, "arch"), owner);
                        tracing::info!(image = %image.id, "Image registered");
                        json(201, &image)
                    }
                });
        })
        .operation("destroy", |o| {
            let store = store.clone();
            o.description("Remove an image").with_capability(MANAGE_IMAGES).control(
                move |inputs: Inputs| {
                    let store = store.clone();
                    async move {
                        let id = input(&inputs, "id");
                        Ok(store.remove_image(id).map_or_else(|| not_found("Image", id), |_| Reply::new(204)))
                    }
                },
            );
        });
}

fn instances(c: &mut CollectionBuilder, store: &Store) {
    c.description("Running machines")
        .operation("index", |o| {
            let store = store.clone();
            o.description("List instances").control(move |_| {
                let store = store.clone();
                async move { json(200, &store.instances()) }
            });
        })
        .operation("show", |o| {
            let store = store.clone();
            o.control(move |inputs: Inputs| {
                let store = store.clone();
                async move {
                    let id = input(&inputs, "id");
                    match store.instance(id) {
                        Some(instance) => json(200, &instance),
                        None => Ok(not_found("Instance", id)),
                    }
                }
            });
        })
        .operation("create", |o| {
            let store = store.clone();
            o.description("Launch an instance")
                .param(ParameterSchema::string("image_id").required().describe("Image to launch"))
                .control(move |inputs: Inputs| {
                    let store = store.clone();
                    async move {
                        let image_id = input(&inputs, "image_id");
                        if store.image(image_id).is_none() {
                            return Ok(not_found("Image", image_id));
                        }
                        json(201, &store.insert_instance(image_id))
                    }
                });
        })
        .operation("destroy", |o| {
            let store = store.clone();
            o.control(move |inputs: Inputs| {
                let store = store.clone();
                async move {
                    let id = input(&inputs, "id");
                    Ok(store.remove_instance(id).map_or_else(|| not_found("Instance", id), |_| Reply::new(204)))
                }
            });
        })
        .action("start", |o| state_action(o, store, InstanceState::Running))
        .action("stop", |o| state_action(o, store, InstanceState::Stopped))
        .action("reboot", |o| {
            let gate = store.clone();
            let store = store.clone();
            o.description("Restart a running instance")
                .when(Gate::dynamic(move || !gate.in_maintenance()))
                .control(move |inputs: Inputs| {
                    let store = store.clone();
                    async move {
                        let id = input(&inputs, "id");
                        match store.instance(id) {
                            Some(instance) if instance.state == InstanceState::Running => {
                                Ok(Reply::text(202, format!("Rebooting {id}")))
                            },
                            Some(_) => Ok(Reply::text(409, format!("Instance '{id}' is not running"))),
                            None => Ok(not_found("Instance", id)),
                        }
                    }
                });
        })
        .collection("volumes", |v| {
            let store = store.clone();
            v.description("Block devices attached to an instance")
                .with_id("volume_id")
                .operation("index", |o| {
                    o.control(move |inputs: Inputs| {
                        let store = store.clone();
                        async move {
                            let id = input(&inputs, "id");
                            match store.instance(id) {
                                Some(instance) => json(200, &instance.volumes),
                                None => Ok(not_found("Instance", id)),
                            }
                        }
                    });
                });
        });
}

fn state_action(o: &mut OperationBuilder, store: &Store, state: InstanceState) {
    let store = store.clone();
    o.control(move |inputs: Inputs| {
        let store = store.clone();
        async move {
            let id = input(&inputs, "id");
            match store.set_state(id, state) {
                Some(instance) => json(200, &instance),
                None => Ok(not_found("Instance", id)),
            }
        }
    });
}
