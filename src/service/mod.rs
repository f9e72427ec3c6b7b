//! 编排层：把存储适配器和确定性引擎串成对外操作

pub mod wallet_engine;

pub use wallet_engine::{
    AddressBatchRequest, AddressRequest, EngineInfo, RegisterRequest, RequestContext, SignRequest,
    WalletEngine,
};
