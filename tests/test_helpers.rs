#![allow(dead_code)]

use async_trait::async_trait;
use nanochef::{
    AiGateway, EditResult, GatewayKind, ImagePayload, NanoChefError, Recipe, RecipeSet, Result,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub fn recipe(title: &str) -> Recipe {
    Recipe {
        title: title.to_string(),
        cooking_time: "15 minutes".into(),
        difficulty: "Easy".into(),
        ingredients: vec!["tomato".into(), "basil".into()],
        instructions: vec!["Chop".into(), "Serve".into()],
        visual_description: format!("{title} plated"),
    }
}

pub fn recipes(titles: &[&str]) -> Vec<Recipe> {
    titles.iter().map(|t| recipe(t)).collect()
}

pub fn photo(tag: &str) -> ImagePayload {
    ImagePayload::new(format!("{tag}-data"), "image/jpeg")
}

fn scripted_failure() -> NanoChefError {
    NanoChefError::Api {
        status: 503,
        message: "scripted failure".into(),
    }
}

enum DishReply {
    Miss,
    Error,
    Panic,
}

/// An in-memory gateway whose answers and timing are set by the test.
#[derive(Default)]
pub struct ScriptedGateway {
    recipe_replies: Mutex<VecDeque<Option<Vec<Recipe>>>>,
    recipe_gate: Mutex<Option<oneshot::Receiver<()>>>,
    dish_replies: Mutex<HashMap<String, DishReply>>,
    dish_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    edit_replies: Mutex<VecDeque<Option<EditResult>>>,
    edit_gate: Mutex<Option<oneshot::Receiver<()>>>,
    seen_instructions: Mutex<Vec<String>>,
    dish_calls: Mutex<HashSet<String>>,
    pub recipe_calls: AtomicUsize,
    pub edit_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_recipes(&self, recipes: Vec<Recipe>) {
        self.recipe_replies.lock().unwrap().push_back(Some(recipes));
    }

    pub fn push_recipe_failure(&self) {
        self.recipe_replies.lock().unwrap().push_back(None);
    }

    /// The next recipe call blocks until the returned sender fires.
    pub fn gate_recipes(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.recipe_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn dish_miss(&self, description: &str) {
        self.dish_replies
            .lock()
            .unwrap()
            .insert(description.to_string(), DishReply::Miss);
    }

    pub fn dish_error(&self, description: &str) {
        self.dish_replies
            .lock()
            .unwrap()
            .insert(description.to_string(), DishReply::Error);
    }

    pub fn dish_panic(&self, description: &str) {
        self.dish_replies
            .lock()
            .unwrap()
            .insert(description.to_string(), DishReply::Panic);
    }

    /// The synthesis call for `description` blocks until the sender fires.
    pub fn gate_dish(&self, description: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.dish_gates
            .lock()
            .unwrap()
            .insert(description.to_string(), rx);
        tx
    }

    pub fn push_edit(&self, result: EditResult) {
        self.edit_replies.lock().unwrap().push_back(Some(result));
    }

    pub fn push_edit_failure(&self) {
        self.edit_replies.lock().unwrap().push_back(None);
    }

    pub fn gate_edit(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.edit_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn seen_instructions(&self) -> Vec<String> {
        self.seen_instructions.lock().unwrap().clone()
    }

    pub fn dish_called(&self, description: &str) -> bool {
        self.dish_calls.lock().unwrap().contains(description)
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    async fn suggest_recipes(&self, _image: &ImagePayload) -> Result<RecipeSet> {
        self.recipe_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.recipe_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let reply = self.recipe_replies.lock().unwrap().pop_front().flatten();
        reply.map(RecipeSet::new).ok_or_else(scripted_failure)
    }

    async fn synthesize_dish_image(&self, description: &str) -> Result<Option<ImagePayload>> {
        self.dish_calls
            .lock()
            .unwrap()
            .insert(description.to_string());
        let gate = self.dish_gates.lock().unwrap().remove(description);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let panics = matches!(
            self.dish_replies.lock().unwrap().get(description),
            Some(DishReply::Panic)
        );
        if panics {
            panic!("scripted panic for {description}");
        }

        let replies = self.dish_replies.lock().unwrap();
        let reply = match replies.get(description) {
            Some(DishReply::Miss) => Ok(None),
            Some(DishReply::Error) => Err(scripted_failure()),
            Some(DishReply::Panic) => unreachable!(),
            None => Ok(Some(ImagePayload::new(
                format!("img:{description}"),
                "image/png",
            ))),
        };
        reply
    }

    async fn edit_image(&self, _image: &ImagePayload, instruction: &str) -> Result<EditResult> {
        self.edit_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        let gate = self.edit_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let reply = self.edit_replies.lock().unwrap().pop_front().flatten();
        reply.ok_or_else(scripted_failure)
    }

    fn kind(&self) -> GatewayKind {
        GatewayKind::Custom
    }
}
